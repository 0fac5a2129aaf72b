use serde::Serialize;
use std::fmt;

/// Identifies an employee inside an organization.
///
/// Every gateway call carries one explicitly; nothing is read from an
/// ambient auth context.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct EmployeeKey {
    pub organization_id: String,
    pub employee_id: String,
}

impl EmployeeKey {
    pub fn new(organization_id: impl Into<String>, employee_id: impl Into<String>) -> Self {
        Self {
            organization_id: organization_id.into(),
            employee_id: employee_id.into(),
        }
    }
}

impl fmt::Display for EmployeeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.organization_id, self.employee_id)
    }
}
