use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum BreakKind {
    Lunch,
    Short,
    Personal,
    Other,
}

impl BreakKind {
    /// Convert enum → DB string
    pub fn to_db_str(&self) -> &'static str {
        match self {
            BreakKind::Lunch => "lunch",
            BreakKind::Short => "short",
            BreakKind::Personal => "personal",
            BreakKind::Other => "other",
        }
    }

    /// Convert DB string → enum
    pub fn from_db_str(s: &str) -> Option<Self> {
        match s {
            "lunch" => Some(BreakKind::Lunch),
            "short" => Some(BreakKind::Short),
            "personal" => Some(BreakKind::Personal),
            "other" => Some(BreakKind::Other),
            _ => None,
        }
    }

    /// Helper: convert input code from CLI (lowercase or uppercase)
    pub fn from_code(code: &str) -> Option<Self> {
        BreakKind::from_db_str(&code.trim().to_lowercase())
    }

    pub fn label(&self) -> &'static str {
        match self {
            BreakKind::Lunch => "Lunch",
            BreakKind::Short => "Short break",
            BreakKind::Personal => "Personal",
            BreakKind::Other => "Other",
        }
    }
}
