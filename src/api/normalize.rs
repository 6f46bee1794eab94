//! Field normalization for loosely-keyed backend records.
//!
//! The backend is a spreadsheet, so the same logical field can arrive as a
//! camelCase key (`customerName`), a column heading (`"Customer Name"`), or a
//! nested key (`customer.name`). Each canonical field is described by an
//! ordered list of [`Accessor`]s; the first one yielding a non-empty value
//! wins, otherwise the field takes its default.

use super::resource::*;
use crate::utils::{datetime, text_processing};
use log::*;
use rand::Rng;
use serde_json::{Map, Value};
use std::sync::atomic::{AtomicUsize, Ordering};

/// One way of reading a field from a raw record.
///
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Accessor {
    /// Top-level key, camelCase or spreadsheet heading.
    Key(&'static str),
    /// Key inside a nested object, e.g. `customer.name`.
    Nested(&'static str, &'static str),
}

use Accessor::{Key, Nested};

/// Accessor tables, in resolution order.
///
pub mod fields {
    use super::Accessor::{self, Key, Nested};

    pub const COMPLAINT_ID: &[Accessor] = &[
        Key("id"),
        Key("complaintId"),
        Key("ID"),
        Key("Complaint ID"),
    ];
    pub const TITLE: &[Accessor] = &[Key("title"), Key("Title")];
    pub const DESCRIPTION: &[Accessor] = &[Key("description"), Key("Description")];
    pub const CATEGORY: &[Accessor] = &[Key("category"), Key("Category"), Key("type")];
    pub const PRIORITY: &[Accessor] = &[Key("priority"), Key("Priority")];
    pub const STATUS: &[Accessor] = &[Key("status"), Key("Status")];
    pub const REGION: &[Accessor] = &[
        Key("region"),
        Key("Region"),
        Key("location"),
        Key("Location"),
    ];
    pub const SERVICE_CENTER: &[Accessor] = &[
        Key("serviceCenter"),
        Key("Service Center"),
        Nested("customer", "serviceCenter"),
    ];
    pub const CREATED_AT: &[Accessor] = &[
        Key("createdAt"),
        Key("Created At"),
        Key("timestamp"),
        Key("date"),
    ];
    pub const UPDATED_AT: &[Accessor] = &[Key("updatedAt"), Key("Updated At")];
    pub const RESOLVED_AT: &[Accessor] = &[Key("resolvedAt"), Key("Resolved At")];
    pub const ESTIMATED_RESOLUTION: &[Accessor] = &[
        Key("estimatedResolution"),
        Key("Estimated Resolution"),
        Key("expectedResolution"),
    ];
    pub const ASSIGNED_TO: &[Accessor] = &[Key("assignedTo"), Key("Assigned To")];
    pub const ASSIGNED_BY: &[Accessor] = &[Key("assignedBy"), Key("Assigned By")];
    pub const CREATED_BY: &[Accessor] = &[Key("createdBy"), Key("Created By")];
    pub const NOTES: &[Accessor] = &[Key("notes"), Key("Notes")];
    pub const ATTACHMENTS: &[Accessor] = &[Key("attachments"), Key("Attachments")];
    pub const TAGS: &[Accessor] = &[Key("tags"), Key("Tags")];

    pub const CUSTOMER_ID: &[Accessor] = &[
        Key("customerId"),
        Key("Customer ID"),
        Nested("customer", "id"),
    ];
    pub const CUSTOMER_NAME: &[Accessor] = &[
        Key("customerName"),
        Key("Customer Name"),
        Nested("customer", "name"),
    ];
    pub const CUSTOMER_EMAIL: &[Accessor] = &[
        Key("customerEmail"),
        Key("Customer Email"),
        Nested("customer", "email"),
    ];
    pub const CUSTOMER_PHONE: &[Accessor] = &[
        Key("customerPhone"),
        Key("Customer Phone"),
        Nested("customer", "phone"),
    ];
    pub const CUSTOMER_ADDRESS: &[Accessor] = &[
        Key("customerAddress"),
        Key("Customer Address"),
        Nested("customer", "address"),
        Key("Location"),
    ];
    pub const CUSTOMER_REGION: &[Accessor] = &[
        Key("region"),
        Key("Region"),
        Nested("customer", "region"),
        Key("Location"),
    ];
    pub const METER_NUMBER: &[Accessor] = &[
        Key("meterNumber"),
        Key("Meter Number"),
        Nested("customer", "meterNumber"),
    ];
    pub const ACCOUNT_NUMBER: &[Accessor] = &[
        Key("accountNumber"),
        Key("Account Number"),
        Nested("customer", "accountNumber"),
    ];
    pub const CONTRACT_NUMBER: &[Accessor] = &[
        Key("contractNumber"),
        Key("Contract Number"),
        Nested("customer", "contractNumber"),
    ];
    pub const BUSINESS_PARTNER: &[Accessor] = &[
        Key("businessPartner"),
        Key("Business Partner"),
        Nested("customer", "businessPartner"),
    ];

    pub const ID: &[Accessor] = &[Key("id"), Key("ID")];
    pub const NAME: &[Accessor] = &[Key("name"), Key("Name")];
    pub const EMAIL: &[Accessor] = &[Key("email"), Key("Email")];
    pub const PHONE: &[Accessor] = &[Key("phone"), Key("Phone")];
    pub const ADDRESS: &[Accessor] = &[
        Key("address"),
        Key("Address"),
        Key("Customer Address"),
    ];
    pub const ROLE: &[Accessor] = &[Key("role"), Key("Role")];
    pub const DEPARTMENT: &[Accessor] = &[Key("department"), Key("Department")];
    pub const IS_ACTIVE: &[Accessor] = &[Key("isActive"), Key("Is Active")];
    pub const LAST_LOGIN: &[Accessor] = &[Key("lastLogin"), Key("Last Login")];
}

/// Resolve the first accessor that yields a usable value. Null, empty strings
/// and whitespace-only strings count as absent.
///
pub fn resolve<'a>(record: &'a Value, accessors: &[Accessor]) -> Option<&'a Value> {
    accessors.iter().find_map(|accessor| {
        let value = match accessor {
            Key(key) => record.get(key),
            Nested(parent, key) => record.get(parent).and_then(|inner| inner.get(key)),
        }?;
        match value {
            Value::Null => None,
            Value::String(s) if s.trim().is_empty() => None,
            _ => Some(value),
        }
    })
}

/// Render a scalar as text. Objects and arrays are not text fields and read
/// as absent.
///
fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

/// Customer id given to complaints whose row names no customer.
pub const UNKNOWN_CUSTOMER_ID: &str = "1";

fn text(record: &Value, accessors: &[Accessor]) -> String {
    resolve(record, accessors)
        .and_then(scalar_text)
        .unwrap_or_default()
}

fn optional_text(record: &Value, accessors: &[Accessor]) -> Option<String> {
    resolve(record, accessors).and_then(scalar_text)
}

fn list(record: &Value, accessors: &[Accessor]) -> Vec<String> {
    match resolve(record, accessors) {
        Some(Value::String(s)) => text_processing::split_list(s),
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(scalar_text)
            .filter(|item| !item.is_empty())
            .collect(),
        _ => Vec::new(),
    }
}

/// Notes cells are discarded entirely when they carry a corrupted
/// serialization marker.
///
pub fn normalize_notes(raw: Option<&Value>) -> Vec<String> {
    match raw {
        Some(Value::String(s)) => text_processing::split_notes(s),
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(scalar_text)
            .filter(|note| !note.is_empty() && !text_processing::has_serialization_marker(note))
            .collect(),
        _ => Vec::new(),
    }
}

/// Negative numeric phone cells are an upstream export bug; they are kept as
/// [`PhoneNumber::Invalid`] so callers can tell them apart from real numbers.
///
pub fn normalize_phone(raw: Option<&Value>) -> PhoneNumber {
    match raw {
        Some(Value::Number(n)) if n.as_f64().map(|f| f < 0.0).unwrap_or(false) => {
            warn!("Phone number arrived as negative number {}; marking invalid", n);
            PhoneNumber::Invalid(n.to_string())
        }
        Some(value) => match scalar_text(value) {
            Some(phone) if !phone.is_empty() => PhoneNumber::Number(phone),
            _ => PhoneNumber::Missing,
        },
        None => PhoneNumber::Missing,
    }
}

/// Identifier for records that carry none, `complaint_<millis>_<9 base36>`.
///
pub fn fallback_complaint_id() -> String {
    let mut rng = rand::thread_rng();
    let suffix: String = (0..9)
        .filter_map(|_| std::char::from_digit(rng.gen_range(0..36), 36))
        .collect();
    format!(
        "complaint_{}_{}",
        chrono::Utc::now().timestamp_millis(),
        suffix
    )
}

/// Counts of values that failed to parse and were replaced by a default.
/// A rising count points at drift in the upstream data.
///
#[derive(Debug, Default)]
pub struct DefaultingStats {
    priority: AtomicUsize,
    status: AtomicUsize,
    category: AtomicUsize,
    role: AtomicUsize,
}

/// Snapshot of [`DefaultingStats`].
///
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct DefaultingCounts {
    pub priority: usize,
    pub status: usize,
    pub category: usize,
    pub role: usize,
}

impl DefaultingStats {
    pub fn snapshot(&self) -> DefaultingCounts {
        DefaultingCounts {
            priority: self.priority.load(Ordering::Relaxed),
            status: self.status.load(Ordering::Relaxed),
            category: self.category.load(Ordering::Relaxed),
            role: self.role.load(Ordering::Relaxed),
        }
    }
}

/// Parse-or-default over a closed enum. Absent input takes the default
/// silently; present but unrecognized input is logged and counted.
///
fn parse_or_default<T: Copy>(
    raw: Option<String>,
    parse: impl Fn(&str) -> Option<T>,
    default: T,
    counter: &AtomicUsize,
    field: &str,
) -> T {
    let raw = match raw {
        Some(raw) if !raw.trim().is_empty() => raw,
        _ => return default,
    };
    match parse(&raw) {
        Some(value) => value,
        None => {
            warn!("Invalid {} value received: {:?}; using default", field, raw);
            counter.fetch_add(1, Ordering::Relaxed);
            default
        }
    }
}

/// Converts raw backend records into canonical records.
///
#[derive(Debug, Default)]
pub struct Normalizer {
    stats: DefaultingStats,
}

impl Normalizer {
    pub fn new() -> Self {
        Normalizer::default()
    }

    pub fn stats(&self) -> DefaultingCounts {
        self.stats.snapshot()
    }

    pub fn priority(&self, raw: Option<String>) -> Priority {
        parse_or_default(
            raw,
            Priority::parse,
            Priority::DEFAULT,
            &self.stats.priority,
            "priority",
        )
    }

    pub fn status(&self, raw: Option<String>) -> Status {
        parse_or_default(
            raw,
            Status::parse,
            Status::DEFAULT,
            &self.stats.status,
            "status",
        )
    }

    pub fn category(&self, raw: Option<String>) -> Category {
        parse_or_default(
            raw,
            Category::parse,
            Category::DEFAULT,
            &self.stats.category,
            "category",
        )
    }

    pub fn role(&self, raw: Option<String>) -> Role {
        parse_or_default(raw, Role::parse, Role::DEFAULT, &self.stats.role, "role")
    }

    /// Normalize a complaint record, including its embedded customer
    /// snapshot.
    ///
    pub fn complaint(&self, raw: &Value) -> Complaint {
        use fields::*;

        let id = match optional_text(raw, COMPLAINT_ID) {
            Some(id) if !id.is_empty() => id,
            _ => {
                let id = fallback_complaint_id();
                warn!("Complaint missing ID, using fallback {}", id);
                id
            }
        };

        let created_at = optional_text(raw, CREATED_AT).unwrap_or_else(datetime::now_iso);
        let updated_at = optional_text(raw, UPDATED_AT).unwrap_or_else(|| created_at.clone());

        Complaint {
            id,
            title: text(raw, TITLE),
            description: text(raw, DESCRIPTION),
            category: self.category(optional_text(raw, CATEGORY)),
            priority: self.priority(optional_text(raw, PRIORITY)),
            status: self.status(optional_text(raw, STATUS)),
            region: text(raw, REGION),
            service_center: text(raw, SERVICE_CENTER),
            created_at,
            updated_at,
            resolved_at: optional_text(raw, RESOLVED_AT),
            estimated_resolution: optional_text(raw, ESTIMATED_RESOLUTION),
            assigned_to: text(raw, ASSIGNED_TO),
            assigned_by: text(raw, ASSIGNED_BY),
            created_by: text(raw, CREATED_BY),
            customer: self.embedded_customer(raw),
            notes: normalize_notes(resolve(raw, NOTES)),
            attachments: list(raw, ATTACHMENTS),
            tags: list(raw, TAGS),
        }
    }

    /// Customer snapshot embedded in a complaint row.
    ///
    fn embedded_customer(&self, raw: &Value) -> Customer {
        use fields::*;
        Customer {
            id: optional_text(raw, CUSTOMER_ID)
                .filter(|id| !id.is_empty())
                .unwrap_or_else(|| UNKNOWN_CUSTOMER_ID.to_string()),
            name: text(raw, CUSTOMER_NAME),
            email: text(raw, CUSTOMER_EMAIL),
            phone: normalize_phone(resolve(raw, CUSTOMER_PHONE)),
            address: text(raw, CUSTOMER_ADDRESS),
            region: text(raw, CUSTOMER_REGION),
            service_center: text(raw, SERVICE_CENTER),
            meter_number: text(raw, METER_NUMBER),
            account_number: text(raw, ACCOUNT_NUMBER),
            contract_number: text(raw, CONTRACT_NUMBER),
            business_partner: text(raw, BUSINESS_PARTNER),
        }
    }

    /// Normalize a standalone customer record.
    ///
    pub fn customer(&self, raw: &Value) -> Customer {
        use fields::*;
        Customer {
            id: text(raw, ID),
            name: text(raw, NAME),
            email: text(raw, EMAIL),
            phone: normalize_phone(resolve(raw, PHONE)),
            address: text(raw, ADDRESS),
            region: text(raw, &[Key("region"), Key("Region")]),
            service_center: text(raw, &[Key("serviceCenter"), Key("Service Center")]),
            meter_number: text(raw, &[Key("meterNumber"), Key("Meter Number")]),
            account_number: text(raw, &[Key("accountNumber"), Key("Account Number")]),
            contract_number: text(raw, &[Key("contractNumber"), Key("Contract Number")]),
            business_partner: text(raw, &[Key("businessPartner"), Key("Business Partner")]),
        }
    }

    /// Normalize a user record.
    ///
    pub fn user(&self, raw: &Value) -> User {
        use fields::*;
        let now = datetime::now_iso();
        User {
            id: text(raw, ID),
            name: text(raw, NAME),
            email: text(raw, EMAIL),
            role: self.role(optional_text(raw, ROLE)),
            region: text(raw, &[Key("region"), Key("Region")]),
            service_center: text(raw, &[Key("serviceCenter"), Key("Service Center")]),
            department: text(raw, DEPARTMENT),
            phone: text(raw, PHONE),
            is_active: is_active(raw),
            created_at: optional_text(raw, CREATED_AT).unwrap_or_else(|| now.clone()),
            updated_at: optional_text(raw, UPDATED_AT).unwrap_or(now),
            last_login: optional_text(raw, LAST_LOGIN),
        }
    }

    /// Convert an activity-feed entry into a notification. `index` is the
    /// zero-based position in the feed and becomes part of the id.
    ///
    pub fn activity_notification(&self, raw: &Value, index: usize) -> Notification {
        Notification {
            id: format!("notif-{}", index + 1),
            title: optional_text(raw, &[Key("action")])
                .unwrap_or_else(|| "System Notification".to_string()),
            message: optional_text(raw, &[Key("description"), Key("details")])
                .unwrap_or_else(|| "Activity update".to_string()),
            kind: NotificationType::parse(&text(raw, &[Key("type")])),
            priority: self.priority(optional_text(raw, &[Key("priority")])),
            is_read: flag(raw, &[Key("read"), Key("isRead")]).unwrap_or(false),
            created_at: optional_text(raw, &[Key("timestamp"), Key("createdAt")])
                .unwrap_or_else(datetime::now_iso),
            related_complaint_id: optional_text(raw, &[Key("complaintId"), Key("relatedId")]),
            action_required: flag(raw, &[Key("actionRequired")]).unwrap_or(false),
        }
    }

    /// Normalize a notification record as stored by the backend.
    ///
    pub fn notification(&self, raw: &Value) -> Notification {
        Notification {
            id: text(raw, &[Key("id"), Key("ID")]),
            title: text(raw, &[Key("title"), Key("Title")]),
            message: text(raw, &[Key("message"), Key("Message")]),
            kind: NotificationType::parse(&text(raw, &[Key("type"), Key("Type")])),
            priority: self.priority(optional_text(raw, &[Key("priority"), Key("Priority")])),
            is_read: flag(raw, &[Key("isRead"), Key("Is Read"), Key("read")]).unwrap_or(false),
            created_at: optional_text(raw, &[Key("createdAt"), Key("Created At")])
                .unwrap_or_else(datetime::now_iso),
            related_complaint_id: optional_text(
                raw,
                &[Key("relatedComplaintId"), Key("Related Complaint ID")],
            ),
            action_required: flag(raw, &[Key("actionRequired"), Key("Action Required")])
                .unwrap_or(false),
        }
    }

    /// Normalize every element of a list payload. Anything other than an
    /// array reads as an empty list.
    ///
    pub fn many<T>(&self, data: Option<&Value>, each: impl Fn(&Self, &Value) -> T) -> Vec<T> {
        match data {
            Some(Value::Array(items)) => items.iter().map(|item| each(self, item)).collect(),
            Some(other) if !other.is_null() => {
                warn!("Expected a list payload but received {}", kind_of(other));
                Vec::new()
            }
            _ => Vec::new(),
        }
    }
}

/// `isActive` is a boolean; anything other than an explicit false-y value
/// keeps the account active.
///
fn is_active(raw: &Value) -> bool {
    flag(raw, fields::IS_ACTIVE).unwrap_or(true)
}

fn flag(raw: &Value, accessors: &[Accessor]) -> Option<bool> {
    // `resolve` treats `false` as present, which is what boolean cells need.
    match resolve(raw, accessors)? {
        Value::Bool(b) => Some(*b),
        Value::String(s) => match s.trim().to_lowercase().as_str() {
            "true" | "yes" | "1" => Some(true),
            "false" | "no" | "0" => Some(false),
            _ => None,
        },
        Value::Number(n) => n.as_f64().map(|f| f != 0.0),
        _ => None,
    }
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

/// Copy of `map` without null or empty-string values.
///
pub fn compact(map: &Map<String, Value>) -> Map<String, Value> {
    map.iter()
        .filter(|(_, value)| match value {
            Value::Null => false,
            Value::String(s) => !s.is_empty(),
            _ => true,
        })
        .map(|(key, value)| (key.clone(), value.clone()))
        .collect()
}
