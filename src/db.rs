use std::io::Read;
use std::path::Path;

use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use serde::Deserialize;
use tracing::info;
use uuid::Uuid;

use crate::error::{IngestError, LeaveError, ParseEnumError, StoreError};
use crate::models::{
    AttendanceRecord, AttendanceStatus, Event, EventType, LeaveRequest, LeaveStatus, LeaveType,
    MarkedBy, SessionType, User, UserRole,
};

/// Anything that can hand the engine the full attendance collection.
pub trait RecordSource {
    fn attendance_records(&self) -> &[AttendanceRecord];
}

/// Account lookup and registration.
pub trait UserStore {
    fn find_by_credentials(&self, email: &str, password: &str) -> Option<User>;
    fn insert(&mut self, registration: Registration) -> Result<User, StoreError>;
}

#[derive(Debug, Clone)]
pub struct Registration {
    pub name: String,
    pub email: String,
    pub password: String,
    pub role: UserRole,
    pub student_id: Option<String>,
    pub department: Option<String>,
}

#[derive(Debug, Clone)]
pub struct LeaveApplication {
    pub student_id: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub reason: String,
    pub leave_type: LeaveType,
    pub proof_document: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct InMemoryStore {
    students: Vec<User>,
    records: Vec<AttendanceRecord>,
    leaves: Vec<LeaveRequest>,
    events: Vec<Event>,
}

impl RecordSource for InMemoryStore {
    fn attendance_records(&self) -> &[AttendanceRecord] {
        &self.records
    }
}

impl InMemoryStore {
    pub fn new(
        students: Vec<User>,
        records: Vec<AttendanceRecord>,
        leaves: Vec<LeaveRequest>,
        events: Vec<Event>,
    ) -> Self {
        Self {
            students,
            records,
            leaves,
            events,
        }
    }

    pub fn students(&self) -> &[User] {
        &self.students
    }

    pub fn student(&self, id: &str) -> Option<&User> {
        self.students.iter().find(|s| s.id == id)
    }

    /// Records are only ever appended.
    pub fn append_records(
        &mut self,
        records: impl IntoIterator<Item = AttendanceRecord>,
    ) -> usize {
        let before = self.records.len();
        self.records.extend(records);
        self.records.len() - before
    }

    pub fn events(&self) -> &[Event] {
        &self.events
    }

    pub fn leaves(&self) -> &[LeaveRequest] {
        &self.leaves
    }

    /// Teachers see every request, students only their own.
    pub fn leaves_for(&self, user: &User) -> Vec<&LeaveRequest> {
        match user.role {
            UserRole::Teacher => self.leaves.iter().collect(),
            UserRole::Student => self
                .leaves
                .iter()
                .filter(|leave| leave.student_id == user.id)
                .collect(),
        }
    }

    /// Leave requests for the logged-in user. Without a login nothing is
    /// visible.
    pub fn visible_leaves(&self, user: Option<&User>) -> Result<Vec<&LeaveRequest>, LeaveError> {
        match user {
            Some(user) => Ok(self.leaves_for(user)),
            None => Err(LeaveError::NotLoggedIn),
        }
    }

    pub fn submit_leave(
        &mut self,
        application: LeaveApplication,
    ) -> Result<&LeaveRequest, LeaveError> {
        if application.end_date < application.start_date {
            return Err(LeaveError::InvalidRange);
        }

        let Some(student) = self.student(&application.student_id) else {
            return Err(LeaveError::UnknownStudent(application.student_id));
        };
        let student_name = student.name.clone();

        let request = LeaveRequest {
            id: Uuid::new_v4().to_string(),
            student_id: application.student_id,
            student_name,
            start_date: application.start_date,
            end_date: application.end_date,
            reason: application.reason,
            leave_type: application.leave_type,
            proof_document: application.proof_document,
            status: LeaveStatus::Pending,
            submitted_at: Utc::now(),
        };

        info!(leave_id = %request.id, student_id = %request.student_id, "leave request submitted");
        self.leaves.push(request);
        Ok(&self.leaves[self.leaves.len() - 1])
    }

    pub fn approve_leave(&mut self, id: &str) -> Result<&LeaveRequest, LeaveError> {
        self.decide_leave(id, LeaveStatus::Approved)
    }

    pub fn reject_leave(&mut self, id: &str) -> Result<&LeaveRequest, LeaveError> {
        self.decide_leave(id, LeaveStatus::Rejected)
    }

    fn decide_leave(
        &mut self,
        id: &str,
        decision: LeaveStatus,
    ) -> Result<&LeaveRequest, LeaveError> {
        let leave = self
            .leaves
            .iter_mut()
            .find(|leave| leave.id == id)
            .ok_or_else(|| LeaveError::NotFound(id.to_string()))?;

        if leave.status != LeaveStatus::Pending {
            return Err(LeaveError::AlreadyDecided {
                id: id.to_string(),
                status: leave.status.to_string(),
            });
        }

        leave.status = decision;
        info!(leave_id = id, status = %decision, "leave request decided");
        Ok(leave)
    }
}

#[derive(Debug, Clone)]
struct Account {
    user: User,
    password: String,
}

impl Account {
    fn matches(&self, email: &str, password: &str) -> bool {
        self.user.email == email && self.password == password
    }

    fn same_email(&self, email: &str) -> bool {
        self.user.email.eq_ignore_ascii_case(email)
    }
}

#[derive(Debug, Clone, Default)]
pub struct InMemoryUserStore {
    accounts: Vec<Account>,
}

impl InMemoryUserStore {
    /// One teacher and one student login.
    pub fn with_demo_accounts() -> Self {
        Self {
            accounts: vec![
                Account {
                    user: User {
                        id: "1".to_string(),
                        name: "Dr. Sarah Johnson".to_string(),
                        email: "teacher@easeattend.com".to_string(),
                        role: UserRole::Teacher,
                        department: Some("Computer Science".to_string()),
                        student_id: None,
                    },
                    password: "teacher123".to_string(),
                },
                Account {
                    user: User {
                        id: "2".to_string(),
                        name: "John Smith".to_string(),
                        email: "student@easeattend.com".to_string(),
                        role: UserRole::Student,
                        department: Some("Computer Science".to_string()),
                        student_id: Some("STU2024001".to_string()),
                    },
                    password: "student123".to_string(),
                },
            ],
        }
    }

    pub fn len(&self) -> usize {
        self.accounts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.accounts.is_empty()
    }
}

impl UserStore for InMemoryUserStore {
    fn find_by_credentials(&self, email: &str, password: &str) -> Option<User> {
        self.accounts
            .iter()
            .find(|account| account.matches(email, password))
            .map(|account| account.user.clone())
    }

    fn insert(&mut self, registration: Registration) -> Result<User, StoreError> {
        if self
            .accounts
            .iter()
            .any(|account| account.same_email(&registration.email))
        {
            return Err(StoreError::DuplicateEmail(registration.email));
        }

        if registration.role == UserRole::Student && registration.student_id.is_none() {
            return Err(StoreError::MissingStudentNumber);
        }

        let user = User {
            id: Uuid::new_v4().to_string(),
            name: registration.name,
            email: registration.email,
            role: registration.role,
            department: registration.department,
            student_id: registration.student_id,
        };

        info!(user_id = %user.id, role = %user.role, "account registered");
        self.accounts.push(Account {
            user: user.clone(),
            password: registration.password,
        });
        Ok(user)
    }
}

fn student(id: &str, name: &str, email: &str, number: &str) -> User {
    User {
        id: id.to_string(),
        name: name.to_string(),
        email: email.to_string(),
        role: UserRole::Student,
        department: Some("Computer Science".to_string()),
        student_id: Some(number.to_string()),
    }
}

fn date(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).unwrap_or_default()
}

fn timestamp(year: i32, month: u32, day: u32, hour: u32, minute: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(year, month, day, hour, minute, 0)
        .single()
        .unwrap_or_default()
}

/// The demo dataset behind the dashboard.
pub fn seed() -> InMemoryStore {
    use AttendanceStatus::*;
    use MarkedBy::*;
    use SessionType::*;

    let students = vec![
        student("2", "John Smith", "john@student.com", "STU2024001"),
        student("3", "Emma Wilson", "emma@student.com", "STU2024002"),
        student("4", "Michael Brown", "michael@student.com", "STU2024003"),
        student("5", "Sarah Davis", "sarah@student.com", "STU2024004"),
        student("6", "James Taylor", "james@student.com", "STU2024005"),
        student("7", "Olivia Martinez", "olivia@student.com", "STU2024006"),
        student("8", "William Anderson", "william@student.com", "STU2024007"),
        student("9", "Sophia Thomas", "sophia@student.com", "STU2024008"),
    ];

    let records: Vec<AttendanceRecord> = [
        ("1", "2", 15, Theoretical, "Data Structures", Present, Ble),
        ("2", "2", 16, Practical, "Data Structures Lab", Present, Task),
        ("3", "2", 17, Theoretical, "Algorithms", Absent, Ble),
        ("4", "3", 15, Theoretical, "Data Structures", Present, Ble),
        ("5", "3", 16, Practical, "Data Structures Lab", Late, Task),
        ("6", "4", 15, Theoretical, "Data Structures", Absent, Ble),
        ("7", "5", 15, Theoretical, "Data Structures", Present, Ble),
    ]
    .into_iter()
    .map(|(id, student_id, day, session_type, subject, status, marked_by)| AttendanceRecord {
        id: id.to_string(),
        student_id: student_id.to_string(),
        date: date(2024, 1, day),
        session_type,
        subject: subject.to_string(),
        status,
        marked_by,
    })
    .collect();

    let leaves = vec![
        LeaveRequest {
            id: "1".to_string(),
            student_id: "2".to_string(),
            student_name: "John Smith".to_string(),
            start_date: date(2024, 1, 20),
            end_date: date(2024, 1, 22),
            reason: "Medical appointment".to_string(),
            leave_type: LeaveType::Medical,
            proof_document: Some("medical_cert.pdf".to_string()),
            status: LeaveStatus::Pending,
            submitted_at: timestamp(2024, 1, 18, 10, 30),
        },
        LeaveRequest {
            id: "2".to_string(),
            student_id: "3".to_string(),
            student_name: "Emma Wilson".to_string(),
            start_date: date(2024, 1, 25),
            end_date: date(2024, 1, 25),
            reason: "Family emergency".to_string(),
            leave_type: LeaveType::Emergency,
            proof_document: None,
            status: LeaveStatus::Approved,
            submitted_at: timestamp(2024, 1, 17, 14, 20),
        },
    ];

    let events = vec![
        Event {
            id: "1".to_string(),
            title: "Mid-Semester Exam".to_string(),
            description: "Data Structures mid-semester examination".to_string(),
            date: date(2024, 2, 15),
            event_type: EventType::Exam,
        },
        Event {
            id: "2".to_string(),
            title: "Assignment Due".to_string(),
            description: "Algorithm analysis assignment submission".to_string(),
            date: date(2024, 1, 25),
            event_type: EventType::Assignment,
        },
        Event {
            id: "3".to_string(),
            title: "Technical Seminar".to_string(),
            description: "Guest lecture on AI/ML".to_string(),
            date: date(2024, 1, 30),
            event_type: EventType::Event,
        },
        Event {
            id: "4".to_string(),
            title: "Republic Day".to_string(),
            description: "National Holiday".to_string(),
            date: date(2024, 1, 26),
            event_type: EventType::Holiday,
        },
    ];

    InMemoryStore::new(students, records, leaves, events)
}

#[derive(Deserialize)]
struct CsvRow {
    id: String,
    student_id: String,
    date: String,
    session_type: String,
    subject: String,
    status: String,
    marked_by: String,
}

pub fn import_csv(csv_path: &Path) -> Result<Vec<AttendanceRecord>, IngestError> {
    let file = std::fs::File::open(csv_path).map_err(|err| IngestError::Open {
        path: csv_path.to_path_buf(),
        source: err.into(),
    })?;
    let records = read_records(file)?;
    info!(path = %csv_path.display(), count = records.len(), "imported attendance records");
    Ok(records)
}

/// Parses and validates attendance rows. The first invalid row rejects the
/// whole batch.
pub fn read_records<R: Read>(reader: R) -> Result<Vec<AttendanceRecord>, IngestError> {
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(reader);
    let headers = reader
        .headers()
        .map_err(|source| IngestError::Csv { line: 1, source })?
        .clone();

    let mut records = Vec::new();
    for result in reader.records() {
        let row = result.map_err(|source| {
            let line = source.position().map_or(0, |p| p.line());
            IngestError::Csv { line, source }
        })?;
        let line = row.position().map_or(0, |p| p.line());
        let raw: CsvRow = row
            .deserialize(Some(&headers))
            .map_err(|source| IngestError::Csv { line, source })?;
        records.push(validate_row(raw, line)?);
    }

    Ok(records)
}

fn validate_row(raw: CsvRow, line: u64) -> Result<AttendanceRecord, IngestError> {
    if raw.id.is_empty() {
        return Err(IngestError::Empty { line, field: "id" });
    }
    if raw.student_id.is_empty() {
        return Err(IngestError::Empty {
            line,
            field: "student_id",
        });
    }

    let date = NaiveDate::parse_from_str(&raw.date, "%Y-%m-%d").map_err(|_| IngestError::Date {
        line,
        value: raw.date.clone(),
    })?;
    let field = |source: ParseEnumError| IngestError::Field { line, source };

    Ok(AttendanceRecord {
        id: raw.id,
        student_id: raw.student_id,
        date,
        session_type: raw.session_type.parse().map_err(field)?,
        subject: raw.subject,
        status: raw.status.parse().map_err(field)?,
        marked_by: raw.marked_by.parse().map_err(field)?,
    })
}
