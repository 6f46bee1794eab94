//! In-memory demo dataset answered when the backend is unavailable.
//!
//! The records cover every status, priority and category. Timestamps are
//! laid out relative to the moment the store is seeded so that the date
//! filters always have something to show.

use super::client::ApiResponse;
use super::resource::*;
use super::transport::{Action, ActionRequest};
use crate::utils::datetime;
use chrono::{DateTime, Duration, Utc};
use log::*;
use serde_json::{json, Value};

pub const DEMO_MESSAGE: &str = "Demo mode - limited functionality";

/// Static users, customers and complaints.
///
#[derive(Clone, Debug)]
pub struct DemoStore {
    users: Vec<User>,
    customers: Vec<Customer>,
    complaints: Vec<Complaint>,
}

/// Date filter understood by `getComplaints`.
///
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DateFilter {
    Today,
    Yesterday,
    ThisWeek,
    ThisMonth,
}

impl DateFilter {
    pub fn parse(raw: &str) -> Option<DateFilter> {
        match raw.trim().to_lowercase().as_str() {
            "today" => Some(DateFilter::Today),
            "yesterday" => Some(DateFilter::Yesterday),
            "thisweek" => Some(DateFilter::ThisWeek),
            "thismonth" => Some(DateFilter::ThisMonth),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            DateFilter::Today => "today",
            DateFilter::Yesterday => "yesterday",
            DateFilter::ThisWeek => "thisweek",
            DateFilter::ThisMonth => "thismonth",
        }
    }

    /// Whether `created` falls inside the window relative to `now`.
    ///
    pub fn matches(&self, created: DateTime<Utc>, now: DateTime<Utc>) -> bool {
        let today = datetime::start_of_day(now);
        match self {
            DateFilter::Today => created >= today,
            DateFilter::Yesterday => created >= today - Duration::days(1) && created < today,
            DateFilter::ThisWeek => created >= datetime::start_of_week(now),
            DateFilter::ThisMonth => created >= datetime::start_of_month(now, 0),
        }
    }
}

fn user(id: &str, name: &str, email: &str, role: Role, region: &str, department: &str) -> User {
    User {
        id: id.to_string(),
        name: name.to_string(),
        email: email.to_string(),
        role,
        region: region.to_string(),
        service_center: String::new(),
        department: department.to_string(),
        phone: String::new(),
        is_active: true,
        created_at: "2024-01-01T00:00:00.000Z".to_string(),
        updated_at: "2024-01-01T00:00:00.000Z".to_string(),
        last_login: None,
    }
}

#[allow(clippy::too_many_arguments)]
fn customer(
    id: &str,
    name: &str,
    email: &str,
    phone: &str,
    address: &str,
    region: &str,
    account: &str,
    contract: &str,
    partner: &str,
) -> Customer {
    Customer {
        id: id.to_string(),
        name: name.to_string(),
        email: email.to_string(),
        phone: PhoneNumber::Number(phone.to_string()),
        address: address.to_string(),
        region: region.to_string(),
        service_center: format!("{} Service Center", region),
        meter_number: format!("MTR-{}", &account[3..]),
        account_number: account.to_string(),
        contract_number: contract.to_string(),
        business_partner: partner.to_string(),
    }
}

struct Seed {
    title: &'static str,
    description: &'static str,
    category: Category,
    priority: Priority,
    status: Status,
    days_ago: i64,
    customer: usize,
    assigned_to: &'static str,
    notes: &'static [&'static str],
}

const SEEDS: [Seed; 10] = [
    Seed {
        title: "Power outage in Bole area",
        description: "No power since early morning across three blocks",
        category: Category::PowerOutage,
        priority: Priority::Critical,
        status: Status::Open,
        days_ago: 0,
        customer: 0,
        assigned_to: "",
        notes: &[],
    },
    Seed {
        title: "Billing discrepancy",
        description: "Charged twice the usual amount for last month",
        category: Category::BillingIssue,
        priority: Priority::Medium,
        status: Status::Pending,
        days_ago: 1,
        customer: 1,
        assigned_to: "callcenter@eeu.gov.et",
        notes: &["Waiting for meter reading history"],
    },
    Seed {
        title: "Prepaid meter rejects tokens",
        description: "Meter shows error code after entering a new token",
        category: Category::MeterProblem,
        priority: Priority::High,
        status: Status::InProgress,
        days_ago: 2,
        customer: 2,
        assigned_to: "technician@eeu.gov.et",
        notes: &["Technician scheduled", "Replacement meter requested"],
    },
    Seed {
        title: "New connection for shop",
        description: "Request to connect a newly built shop to the grid",
        category: Category::ConnectionRequest,
        priority: Priority::Low,
        status: Status::Open,
        days_ago: 0,
        customer: 1,
        assigned_to: "",
        notes: &[],
    },
    Seed {
        title: "Evening voltage drops",
        description: "Lights dim and appliances shut off every evening",
        category: Category::VoltageFluctuation,
        priority: Priority::High,
        status: Status::Escalated,
        days_ago: 3,
        customer: 2,
        assigned_to: "foreman@eeu.gov.et",
        notes: &["Escalated to regional grid team"],
    },
    Seed {
        title: "Transformer damaged after storm",
        description: "Transformer on the main road is leaking oil",
        category: Category::EquipmentDamage,
        priority: Priority::Critical,
        status: Status::InProgress,
        days_ago: 5,
        customer: 0,
        assigned_to: "foreman@eeu.gov.et",
        notes: &["Area isolated", "Crew dispatched"],
    },
    Seed {
        title: "Slow response at service center",
        description: "Waited four hours without being served",
        category: Category::ServiceQuality,
        priority: Priority::Low,
        status: Status::Resolved,
        days_ago: 9,
        customer: 1,
        assigned_to: "manager@eeu.gov.et",
        notes: &["Apology issued to customer"],
    },
    Seed {
        title: "Exposed live wire near school",
        description: "A cable is hanging low next to the school gate",
        category: Category::SafetyConcern,
        priority: Priority::Critical,
        status: Status::Resolved,
        days_ago: 14,
        customer: 2,
        assigned_to: "technician@eeu.gov.et",
        notes: &["Cable secured"],
    },
    Seed {
        title: "Leaning street light pole",
        description: "Pole is leaning towards the houses after heavy rain",
        category: Category::Other,
        priority: Priority::Medium,
        status: Status::Closed,
        days_ago: 35,
        customer: 0,
        assigned_to: "technician@eeu.gov.et",
        notes: &["Pole replaced", "Customer confirmed"],
    },
    Seed {
        title: "Duplicate reading charge",
        description: "Same meter reading billed on two invoices",
        category: Category::BillingIssue,
        priority: Priority::Medium,
        status: Status::Cancelled,
        days_ago: 60,
        customer: 1,
        assigned_to: "",
        notes: &["Customer withdrew the complaint"],
    },
];

impl DemoStore {
    /// Build the demo dataset with timestamps relative to `now`.
    ///
    pub fn seeded(now: DateTime<Utc>) -> DemoStore {
        let users = vec![
            user("1", "System Administrator", "admin@eeu.gov.et", Role::Admin, "Addis Ababa", "IT"),
            user("2", "Operations Manager", "manager@eeu.gov.et", Role::Manager, "Addis Ababa", "Operations"),
            user("3", "Field Foreman", "foreman@eeu.gov.et", Role::Foreman, "Oromia", "Field Operations"),
            user("4", "Call Center Agent", "callcenter@eeu.gov.et", Role::CallAttendant, "Addis Ababa", "Customer Service"),
            user("5", "Line Technician", "technician@eeu.gov.et", Role::Technician, "Amhara", "Maintenance"),
        ];
        let customers = vec![
            customer(
                "1",
                "Abebe Kebede",
                "abebe@example.com",
                "+251911234567",
                "Bole, Addis Ababa",
                "Addis Ababa",
                "EEU001234",
                "CA-100234",
                "BP-200045",
            ),
            customer(
                "2",
                "Tigist Haile",
                "tigist@example.com",
                "+251922345678",
                "Kebele 14, Bahir Dar",
                "Amhara",
                "EEU002345",
                "CA-100871",
                "BP-200311",
            ),
            customer(
                "3",
                "Mohammed Ali",
                "mohammed@example.com",
                "+251933456789",
                "Adama Town",
                "Oromia",
                "EEU003456",
                "CA-101502",
                "BP-200978",
            ),
        ];

        let today = datetime::start_of_day(now);
        let complaints = SEEDS
            .iter()
            .enumerate()
            .map(|(index, seed)| {
                let created = if seed.days_ago == 0 {
                    today
                } else {
                    today - Duration::days(seed.days_ago) + Duration::hours(9)
                };
                let closed_out = matches!(seed.status, Status::Resolved | Status::Closed);
                let updated = if closed_out {
                    created + Duration::hours(26)
                } else {
                    created
                };
                let customer = customers[seed.customer].clone();
                Complaint {
                    id: format!("CMP-{}", 1001 + index),
                    title: seed.title.to_string(),
                    description: seed.description.to_string(),
                    category: seed.category,
                    priority: seed.priority,
                    status: seed.status,
                    region: customer.region.clone(),
                    service_center: customer.service_center.clone(),
                    created_at: datetime::to_iso(created),
                    updated_at: datetime::to_iso(updated),
                    resolved_at: closed_out.then(|| datetime::to_iso(updated)),
                    estimated_resolution: (!closed_out && seed.status.is_active())
                        .then(|| datetime::to_iso(created + Duration::days(3))),
                    assigned_to: seed.assigned_to.to_string(),
                    assigned_by: if seed.assigned_to.is_empty() {
                        String::new()
                    } else {
                        "manager@eeu.gov.et".to_string()
                    },
                    created_by: "callcenter@eeu.gov.et".to_string(),
                    customer,
                    notes: seed.notes.iter().map(|n| n.to_string()).collect(),
                    attachments: Vec::new(),
                    tags: Vec::new(),
                }
            })
            .collect();

        DemoStore {
            users,
            customers,
            complaints,
        }
    }

    pub fn users(&self) -> &[User] {
        &self.users
    }

    pub fn customers(&self) -> &[Customer] {
        &self.customers
    }

    pub fn complaints(&self) -> &[Complaint] {
        &self.complaints
    }

    /// Answer `request` from the demo dataset.
    ///
    pub fn respond(&self, request: &ActionRequest, now: DateTime<Utc>) -> ApiResponse<Value> {
        debug!("Generating demo response for action {}", request.action);
        match request.action {
            Action::Login => {
                let email = request.text_param("email").unwrap_or_default();
                let user = self
                    .users
                    .iter()
                    .find(|u| u.email == email)
                    .or_else(|| self.users.first());
                ApiResponse::ok(json!({
                    "user": user,
                    "token": format!("demo-token-{}", now.timestamp_millis()),
                }))
            }
            Action::GetComplaints => ApiResponse::ok(to_value(&self.filter_complaints(request, now))),
            Action::GetUsers => ApiResponse::ok(to_value(&self.users)),
            Action::GetCustomers => ApiResponse::ok(to_value(&self.customers)),
            Action::SearchCustomer => match self.search_customer(request) {
                Some(customer) => ApiResponse::ok(to_value(customer)),
                None => ApiResponse::failure("Customer not found"),
            },
            Action::HealthCheck => ApiResponse::ok(json!({
                "status": "OK (Demo Mode)",
                "timestamp": datetime::to_iso(now),
                "mode": "demo",
            })),
            _ => ApiResponse::ok(json!([])).with_message(DEMO_MESSAGE),
        }
    }

    /// Demo complaints after applying the `dateFilter`, `status` and
    /// `priority` parameters. Status and priority match case-insensitively.
    ///
    pub fn filter_complaints(&self, request: &ActionRequest, now: DateTime<Utc>) -> Vec<&Complaint> {
        let date_filter = request.text_param("dateFilter").and_then(DateFilter::parse);
        let status = request.text_param("status");
        let priority = request.text_param("priority");

        self.complaints
            .iter()
            .filter(|c| match date_filter {
                Some(filter) => datetime::parse_timestamp(&c.created_at)
                    .map(|created| filter.matches(created, now))
                    .unwrap_or(false),
                None => true,
            })
            .filter(|c| status.map_or(true, |s| c.status.as_str().eq_ignore_ascii_case(s)))
            .filter(|c| priority.map_or(true, |p| c.priority.as_str().eq_ignore_ascii_case(p)))
            .collect()
    }

    fn search_customer(&self, request: &ActionRequest) -> Option<&Customer> {
        let value = request.text_param("value")?;
        let by_partner = request.text_param("type") == Some("business");
        self.customers.iter().find(|c| {
            if by_partner {
                c.business_partner.eq_ignore_ascii_case(value)
            } else {
                c.contract_number.eq_ignore_ascii_case(value)
            }
        })
    }
}

fn to_value<T: serde::Serialize + ?Sized>(value: &T) -> Value {
    serde_json::to_value(value).unwrap_or_else(|e| {
        error!("Failed to serialize demo data: {}", e);
        Value::Null
    })
}
