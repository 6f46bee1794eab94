//! Canonical record shapes produced by normalization.
//!
//! Every record here is fully populated: fields the backend omitted carry a
//! type-appropriate default rather than being absent.

use fake::Dummy;
use serde::{Serialize, Serializer};
use std::fmt;

/// Complaint priority. Unrecognized input becomes [`Priority::DEFAULT`].
///
#[derive(Clone, Copy, Debug, Dummy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    Low,
    Medium,
    High,
    Critical,
}

impl Priority {
    pub const DEFAULT: Priority = Priority::Medium;
    pub const ALL: [Priority; 4] = [
        Priority::Low,
        Priority::Medium,
        Priority::High,
        Priority::Critical,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Priority::Low => "low",
            Priority::Medium => "medium",
            Priority::High => "high",
            Priority::Critical => "critical",
        }
    }

    /// Case-insensitive match against the closed set.
    ///
    pub fn parse(raw: &str) -> Option<Priority> {
        let raw = raw.trim().to_lowercase();
        Priority::ALL.into_iter().find(|p| p.as_str() == raw)
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Complaint lifecycle status. Unrecognized input becomes [`Status::DEFAULT`].
///
#[derive(Clone, Copy, Debug, Dummy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Status {
    Open,
    InProgress,
    Pending,
    Resolved,
    Escalated,
    Closed,
    Cancelled,
}

impl Status {
    pub const DEFAULT: Status = Status::Open;
    pub const ALL: [Status; 7] = [
        Status::Open,
        Status::InProgress,
        Status::Pending,
        Status::Resolved,
        Status::Escalated,
        Status::Closed,
        Status::Cancelled,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Status::Open => "open",
            Status::InProgress => "in_progress",
            Status::Pending => "pending",
            Status::Resolved => "resolved",
            Status::Escalated => "escalated",
            Status::Closed => "closed",
            Status::Cancelled => "cancelled",
        }
    }

    /// Case-insensitive match after trimming. Dashboard filters spell
    /// "in progress" three ways (`in_progress`, `in-progress`,
    /// `in progress`); all map to [`Status::InProgress`].
    ///
    pub fn parse(raw: &str) -> Option<Status> {
        let raw = raw.trim().to_lowercase().replace(['-', ' '], "_");
        Status::ALL.into_iter().find(|s| s.as_str() == raw)
    }

    /// Statuses that still need work from staff.
    ///
    pub fn is_active(&self) -> bool {
        !matches!(self, Status::Resolved | Status::Closed | Status::Cancelled)
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Complaint category. Unrecognized input becomes [`Category::DEFAULT`].
///
#[derive(Clone, Copy, Debug, Dummy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    PowerOutage,
    BillingIssue,
    MeterProblem,
    ConnectionRequest,
    VoltageFluctuation,
    EquipmentDamage,
    ServiceQuality,
    SafetyConcern,
    Other,
}

impl Category {
    pub const DEFAULT: Category = Category::Other;
    pub const ALL: [Category; 9] = [
        Category::PowerOutage,
        Category::BillingIssue,
        Category::MeterProblem,
        Category::ConnectionRequest,
        Category::VoltageFluctuation,
        Category::EquipmentDamage,
        Category::ServiceQuality,
        Category::SafetyConcern,
        Category::Other,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::PowerOutage => "power_outage",
            Category::BillingIssue => "billing_issue",
            Category::MeterProblem => "meter_problem",
            Category::ConnectionRequest => "connection_request",
            Category::VoltageFluctuation => "voltage_fluctuation",
            Category::EquipmentDamage => "equipment_damage",
            Category::ServiceQuality => "service_quality",
            Category::SafetyConcern => "safety_concern",
            Category::Other => "other",
        }
    }

    /// Human-readable label as shown on the complaint form.
    ///
    pub fn label(&self) -> &'static str {
        match self {
            Category::PowerOutage => "Power Outage",
            Category::BillingIssue => "Billing Issue",
            Category::MeterProblem => "Meter Problem",
            Category::ConnectionRequest => "New Connection Request",
            Category::VoltageFluctuation => "Voltage Fluctuation",
            Category::EquipmentDamage => "Equipment Damage",
            Category::ServiceQuality => "Service Quality",
            Category::SafetyConcern => "Safety Concern",
            Category::Other => "Other",
        }
    }

    /// Accepts the snake_case value, the label, or the short spreadsheet
    /// spelling (`"Billing"`).
    ///
    pub fn parse(raw: &str) -> Option<Category> {
        let key = raw.trim().to_lowercase().replace(['-', ' '], "_");
        if key == "billing" {
            return Some(Category::BillingIssue);
        }
        Category::ALL
            .into_iter()
            .find(|c| c.as_str() == key || c.label().to_lowercase().replace(' ', "_") == key)
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Staff or customer role.
///
#[derive(Clone, Copy, Debug, Dummy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Role {
    Admin,
    Manager,
    Foreman,
    CallAttendant,
    Technician,
    Customer,
}

impl Role {
    pub const DEFAULT: Role = Role::Technician;
    pub const ALL: [Role; 6] = [
        Role::Admin,
        Role::Manager,
        Role::Foreman,
        Role::CallAttendant,
        Role::Technician,
        Role::Customer,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Manager => "manager",
            Role::Foreman => "foreman",
            Role::CallAttendant => "call-attendant",
            Role::Technician => "technician",
            Role::Customer => "customer",
        }
    }

    pub fn parse(raw: &str) -> Option<Role> {
        let raw = raw.trim().to_lowercase().replace(['_', ' '], "-");
        Role::ALL.into_iter().find(|r| r.as_str() == raw)
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Notification kind.
///
#[derive(Clone, Copy, Debug, Dummy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationType {
    Info,
    Warning,
    Success,
    Error,
    System,
}

impl NotificationType {
    pub fn parse(raw: &str) -> NotificationType {
        match raw.trim().to_lowercase().as_str() {
            "warning" => NotificationType::Warning,
            "success" => NotificationType::Success,
            "error" => NotificationType::Error,
            "system" => NotificationType::System,
            _ => NotificationType::Info,
        }
    }
}

/// Customer phone as received from the backend.
///
/// The spreadsheet backend sometimes exports phone cells as negative numbers.
/// Those are kept as [`PhoneNumber::Invalid`] instead of being replaced by
/// made-up contact data.
///
#[derive(Clone, Debug, Dummy, PartialEq, Eq)]
pub enum PhoneNumber {
    Number(String),
    Invalid(String),
    Missing,
}

impl PhoneNumber {
    /// Placeholder the web UI used to show for corrupted phone cells.
    pub const LEGACY_PLACEHOLDER: &'static str = "+251-911-123456";

    pub fn as_str(&self) -> Option<&str> {
        match self {
            PhoneNumber::Number(n) => Some(n),
            _ => None,
        }
    }

    pub fn is_invalid(&self) -> bool {
        matches!(self, PhoneNumber::Invalid(_))
    }

    /// Display string with the legacy placeholder substituted for corrupted
    /// values.
    ///
    pub fn display_or_placeholder(&self) -> &str {
        match self {
            PhoneNumber::Number(n) => n,
            PhoneNumber::Invalid(_) => PhoneNumber::LEGACY_PLACEHOLDER,
            PhoneNumber::Missing => "",
        }
    }
}

impl Default for PhoneNumber {
    fn default() -> Self {
        PhoneNumber::Missing
    }
}

impl Serialize for PhoneNumber {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            PhoneNumber::Number(n) | PhoneNumber::Invalid(n) => serializer.serialize_str(n),
            PhoneNumber::Missing => serializer.serialize_str(""),
        }
    }
}

/// Defines customer data structure.
///
#[derive(Clone, Debug, Default, Dummy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Customer {
    pub id: String,
    pub name: String,
    pub email: String,
    pub phone: PhoneNumber,
    pub address: String,
    pub region: String,
    pub service_center: String,
    pub meter_number: String,
    pub account_number: String,
    pub contract_number: String,
    pub business_partner: String,
}

/// Defines complaint data structure.
///
#[derive(Clone, Debug, Dummy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Complaint {
    pub id: String,
    pub title: String,
    pub description: String,
    pub category: Category,
    pub priority: Priority,
    pub status: Status,
    pub region: String,
    pub service_center: String,
    pub created_at: String,
    pub updated_at: String,
    pub resolved_at: Option<String>,
    pub estimated_resolution: Option<String>,
    pub assigned_to: String,
    pub assigned_by: String,
    pub created_by: String,
    pub customer: Customer,
    pub notes: Vec<String>,
    pub attachments: Vec<String>,
    pub tags: Vec<String>,
}

/// Defines user data structure.
///
#[derive(Clone, Debug, Dummy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: String,
    pub name: String,
    pub email: String,
    pub role: Role,
    pub region: String,
    pub service_center: String,
    pub department: String,
    pub phone: String,
    pub is_active: bool,
    pub created_at: String,
    pub updated_at: String,
    pub last_login: Option<String>,
}

/// Defines notification data structure. Notifications live in session
/// memory only.
///
#[derive(Clone, Debug, Dummy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    pub id: String,
    pub title: String,
    pub message: String,
    #[serde(rename = "type")]
    pub kind: NotificationType,
    pub priority: Priority,
    pub is_read: bool,
    pub created_at: String,
    pub related_complaint_id: Option<String>,
    pub action_required: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_priority_parse_is_case_insensitive() {
        assert_eq!(Priority::parse(" HIGH "), Some(Priority::High));
        assert_eq!(Priority::parse("Critical"), Some(Priority::Critical));
        assert_eq!(Priority::parse("urgent"), None);
    }

    #[test]
    fn test_status_parse_accepts_in_progress_spellings() {
        assert_eq!(Status::parse("in_progress"), Some(Status::InProgress));
        assert_eq!(Status::parse("In-Progress"), Some(Status::InProgress));
        assert_eq!(Status::parse("in progress"), Some(Status::InProgress));
        assert_eq!(Status::parse("ESCALATED"), Some(Status::Escalated));
        assert_eq!(Status::parse("reopened"), None);
    }

    #[test]
    fn test_category_parse_variants() {
        assert_eq!(Category::parse("power_outage"), Some(Category::PowerOutage));
        assert_eq!(Category::parse("Power Outage"), Some(Category::PowerOutage));
        assert_eq!(Category::parse("Billing"), Some(Category::BillingIssue));
        assert_eq!(
            Category::parse("New Connection Request"),
            Some(Category::ConnectionRequest)
        );
        assert_eq!(Category::parse("weather"), None);
    }

    #[test]
    fn test_role_parse() {
        assert_eq!(Role::parse("call_attendant"), Some(Role::CallAttendant));
        assert_eq!(Role::parse("Call Attendant"), Some(Role::CallAttendant));
        assert_eq!(Role::parse("staff"), None);
    }

    #[test]
    fn test_serialized_enum_values() {
        assert_eq!(
            serde_json::to_value(Status::InProgress).unwrap(),
            serde_json::json!("in_progress")
        );
        assert_eq!(
            serde_json::to_value(Role::CallAttendant).unwrap(),
            serde_json::json!("call-attendant")
        );
    }

    #[test]
    fn test_phone_number_display_and_serialize() {
        let invalid = PhoneNumber::Invalid("-251911".to_string());
        assert!(invalid.is_invalid());
        assert_eq!(invalid.as_str(), None);
        assert_eq!(invalid.display_or_placeholder(), "+251-911-123456");
        assert_eq!(
            serde_json::to_value(&invalid).unwrap(),
            serde_json::json!("-251911")
        );
        assert_eq!(
            serde_json::to_value(PhoneNumber::Missing).unwrap(),
            serde_json::json!("")
        );
    }
}
