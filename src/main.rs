use std::path::PathBuf;

use anyhow::{bail, Context};
use chrono::{NaiveDate, Utc};
use clap::{Parser, Subcommand};
use tracing::warn;
use tracing_subscriber::EnvFilter;

use attendance_risk::config::EngineConfig;
use attendance_risk::db::{
    self, InMemoryStore, InMemoryUserStore, RecordSource, Registration, UserStore,
};
use attendance_risk::models::{AttendanceStats, RiskPrediction, User, UserRole};
use attendance_risk::session::SessionCache;
use attendance_risk::{risk, stats, summary};

#[derive(Parser)]
#[command(name = "attendance-risk")]
#[command(about = "Attendance stats and risk alerts for the class dashboard", long_about = None)]
struct Cli {
    /// TOML engine configuration
    #[arg(long, global = true, env = "ATTENDANCE_CONFIG")]
    config: Option<PathBuf>,
    /// Extra attendance records (CSV) appended to the seed data
    #[arg(long, global = true, env = "ATTENDANCE_RECORDS")]
    records: Option<PathBuf>,
    /// Print JSON instead of text
    #[arg(long, global = true)]
    json: bool,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Attendance totals for a student (defaults to the logged-in user)
    Stats {
        #[arg(long)]
        student: Option<String>,
    },
    /// Risk tier, projection and advice for a student
    Risk {
        #[arg(long)]
        student: Option<String>,
    },
    /// Students at high or critical risk
    AtRisk,
    /// List students, optionally filtered by name or student number
    Students {
        #[arg(long)]
        search: Option<String>,
    },
    /// Leave requests visible to the logged-in user
    Leaves,
    /// Approve a pending leave request
    ApproveLeave { id: String },
    /// Reject a pending leave request
    RejectLeave { id: String },
    /// Event counts and upcoming events
    Events {
        #[arg(long)]
        from: Option<NaiveDate>,
    },
    /// Validate an attendance CSV without touching the seed data
    Import {
        #[arg(long)]
        csv: PathBuf,
    },
    /// Log in with a demo account
    Login {
        #[arg(long)]
        email: String,
        #[arg(long)]
        password: String,
    },
    /// Register an account and log in as it
    Register {
        #[arg(long)]
        name: String,
        #[arg(long)]
        email: String,
        #[arg(long)]
        password: String,
        #[arg(long, default_value = "student")]
        role: UserRole,
        #[arg(long)]
        student_id: Option<String>,
        #[arg(long)]
        department: Option<String>,
    },
    /// Forget the logged-in user
    Logout,
    /// Show the logged-in user
    Whoami,
}

fn main() -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = EngineConfig::load_or_default(cli.config.as_deref())
        .context("failed to load config")?;
    let session = SessionCache::new(&config.session_path);

    let mut store = db::seed();
    if let Some(path) = &cli.records {
        let records = db::import_csv(path).context("failed to import attendance records")?;
        store.append_records(records);
    }
    let policy = config.empty_records;

    match cli.command {
        Commands::Stats { student } => {
            let student_id = resolve_student(student, &session)?;
            let records = store.attendance_records();
            let student_stats = stats::compute_stats(records, &student_id, &policy);
            if cli.json {
                println!("{}", serde_json::to_string_pretty(&student_stats)?);
            } else {
                let can_miss = stats::classes_can_miss(&student_stats, config.max_absence_ratio);
                print_stats(&student_id, &student_stats, can_miss);
            }
        }
        Commands::Risk { student } => {
            let student_id = resolve_student(student, &session)?;
            let records = store.attendance_records();
            let student_stats = stats::compute_stats(records, &student_id, &policy);
            let prediction = risk::classify(&student_stats, &student_id);
            if cli.json {
                println!("{}", serde_json::to_string_pretty(&prediction)?);
            } else {
                print_prediction(&prediction);
            }
        }
        Commands::AtRisk => {
            let records = store.attendance_records();
            let flagged = risk::at_risk_students(store.students(), records, &policy);
            if cli.json {
                let predictions: Vec<&RiskPrediction> = flagged.iter().map(|(_, p)| p).collect();
                println!("{}", serde_json::to_string_pretty(&predictions)?);
            } else if flagged.is_empty() {
                println!("No students at risk.");
            } else {
                println!("Students at risk:");
                for (student, prediction) in &flagged {
                    println!(
                        "- {} ({}) {} at {}%",
                        student.name,
                        student_number(student),
                        prediction.risk_level,
                        prediction.attendance_percentage
                    );
                }
            }
        }
        Commands::Students { search } => {
            let query = search.as_deref().unwrap_or("");
            let matches = summary::search_students(store.students(), query);
            if cli.json {
                println!("{}", serde_json::to_string_pretty(&matches)?);
            } else {
                for student in matches {
                    let records = store.attendance_records();
                    let student_stats = stats::compute_stats(records, &student.id, &policy);
                    println!(
                        "- {} ({}) {}% of {} classes",
                        student.name,
                        student_number(student),
                        student_stats.percentage,
                        student_stats.total_classes
                    );
                }
            }
        }
        Commands::Leaves => {
            let user = session.load()?;
            let leaves = store.visible_leaves(user.as_ref())?;
            let counts = summary::leave_counts(leaves.iter().copied());
            if cli.json {
                println!("{}", serde_json::to_string_pretty(&leaves)?);
            } else {
                println!(
                    "{} requests: {} pending, {} approved, {} rejected",
                    counts.total, counts.pending, counts.approved, counts.rejected
                );
                for leave in leaves {
                    println!(
                        "- [{}] {} {} to {} ({}): {}",
                        leave.id,
                        leave.student_name,
                        leave.start_date,
                        leave.end_date,
                        leave.leave_type,
                        leave.status
                    );
                }
            }
        }
        Commands::ApproveLeave { id } => {
            require_teacher(&session)?;
            let leave = store.approve_leave(&id)?;
            println!("Leave {} for {} approved.", leave.id, leave.student_name);
        }
        Commands::RejectLeave { id } => {
            require_teacher(&session)?;
            let leave = store.reject_leave(&id)?;
            println!("Leave {} for {} rejected.", leave.id, leave.student_name);
        }
        Commands::Events { from } => {
            let today = from.unwrap_or_else(|| Utc::now().date_naive());
            let counts = summary::event_counts(store.events());
            let upcoming = summary::upcoming_events(store.events(), today);
            if cli.json {
                println!("{}", serde_json::to_string_pretty(&upcoming)?);
            } else {
                for count in counts {
                    println!("{}: {}", count.event_type, count.count);
                }
                if upcoming.is_empty() {
                    println!("No events from {today}.");
                }
                for event in upcoming {
                    println!(
                        "- {} {} ({}): {}",
                        event.date, event.title, event.event_type, event.description
                    );
                }
            }
        }
        Commands::Import { csv } => {
            let records = db::import_csv(&csv).context("failed to import attendance records")?;
            let mut scratch = InMemoryStore::default();
            let count = scratch.append_records(records);
            let mut student_ids: Vec<&str> = scratch
                .attendance_records()
                .iter()
                .map(|r| r.student_id.as_str())
                .collect();
            student_ids.sort_unstable();
            student_ids.dedup();
            println!(
                "{count} valid records for {} students in {}.",
                student_ids.len(),
                csv.display()
            );
        }
        Commands::Login { email, password } => {
            let users = InMemoryUserStore::with_demo_accounts();
            let Some(user) = users.find_by_credentials(&email, &password) else {
                warn!(%email, "login rejected");
                bail!("invalid email or password");
            };
            session.save(&user)?;
            println!("Logged in as {} ({}).", user.name, user.role);
        }
        Commands::Register {
            name,
            email,
            password,
            role,
            student_id,
            department,
        } => {
            let mut users = InMemoryUserStore::with_demo_accounts();
            let user = users.insert(Registration {
                name,
                email,
                password,
                role,
                student_id,
                department,
            })?;
            session.save(&user)?;
            println!("Registered and logged in as {} ({}).", user.name, user.id);
        }
        Commands::Logout => {
            session.clear()?;
            println!("Logged out.");
        }
        Commands::Whoami => match session.load()? {
            Some(user) => println!("{} <{}> ({})", user.name, user.email, user.role),
            None => println!("Not logged in."),
        },
    }

    Ok(())
}

fn student_number(student: &User) -> &str {
    student.student_id.as_deref().unwrap_or(&student.id)
}

fn resolve_student(explicit: Option<String>, session: &SessionCache) -> anyhow::Result<String> {
    if let Some(id) = explicit {
        return Ok(id);
    }

    match session.load()? {
        Some(user) if user.role == UserRole::Student => Ok(user.id),
        Some(_) => bail!("teachers must pass --student"),
        None => bail!("log in or pass --student"),
    }
}

fn require_teacher(session: &SessionCache) -> anyhow::Result<()> {
    match session.load()? {
        Some(user) if user.role == UserRole::Teacher => Ok(()),
        _ => {
            let path = session.path().display();
            warn!(%path, "leave decision without a teacher session");
            bail!("only a logged-in teacher can decide leave requests")
        }
    }
}

fn print_stats(student_id: &str, stats: &AttendanceStats, can_miss: u32) {
    println!(
        "Student {student_id}: {}/{} classes ({}%)",
        stats.attended, stats.total_classes, stats.percentage
    );
    let sessions = [
        ("Theory", stats.theoretical),
        ("Practical", stats.practical),
    ];
    for (label, tally) in sessions {
        match tally.percentage() {
            Some(pct) => println!("  {label}: {}/{} ({pct}%)", tally.attended, tally.total),
            None => println!("  {label}: no classes"),
        }
    }
    println!("  Can miss {can_miss} more");
}

fn print_prediction(prediction: &RiskPrediction) {
    println!(
        "Student {}: {} risk at {}% (projected {}% at term end)",
        prediction.student_id,
        prediction.risk_level,
        prediction.attendance_percentage,
        prediction.predicted_end_percentage
    );
    for alert in &prediction.alerts {
        println!("  ! {alert}");
    }
    for recommendation in &prediction.recommendations {
        println!("  - {recommendation}");
    }
}
