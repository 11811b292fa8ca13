use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use serde::Serialize;

use classroom::net::classroom::ClassroomClient;
use classroom::net::types::{NewAssignment, NewCourse, NewSubmission};
use classroom::routes::guard;
use classroom::{ClientConfig, ClientError, Outcome, Role, Route, SessionStore};

#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error(transparent)]
    Client(#[from] ClientError),
    #[error("invalid JSON payload: {0}")]
    InvalidJson(#[from] serde_json::Error),
    #[error("not logged in; run `classroom login` first")]
    NotLoggedIn,
}

#[derive(Parser, Debug)]
#[command(name = "classroom", about = "Classroom API client: session, routing, and courses")]
struct Cli {
    /// Overrides `CLASSROOM_API_URL`.
    #[arg(long)]
    api_url: Option<String>,

    /// Overrides `CLASSROOM_TOKEN_PATH`.
    #[arg(long)]
    token_path: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    Login {
        #[arg(long)]
        email: String,
        #[arg(long, env = "CLASSROOM_PASSWORD", hide_env_values = true)]
        password: String,
    },
    Register {
        #[arg(long)]
        email: String,
        #[arg(long, env = "CLASSROOM_PASSWORD", hide_env_values = true)]
        password: String,
        #[arg(long)]
        full_name: String,
        #[arg(long, help = "teacher or student")]
        role: Role,
    },
    Logout,
    Whoami,
    /// Show what the route guard does for a path.
    Open {
        #[arg(default_value = "/")]
        path: String,
    },
    Courses(CoursesCommand),
    Assignments(AssignmentsCommand),
    Submissions(SubmissionsCommand),
    Recommendations,
}

#[derive(Args, Debug)]
struct CoursesCommand {
    #[command(subcommand)]
    command: CoursesSubcommand,
}

#[derive(Subcommand, Debug)]
enum CoursesSubcommand {
    List,
    Browse,
    Show {
        course_id: i64,
    },
    Status {
        course_id: i64,
    },
    Create {
        #[arg(long)]
        title: String,
        #[arg(long, default_value = "")]
        description: String,
        #[arg(long)]
        subject: String,
    },
    Enroll {
        course_id: i64,
    },
}

#[derive(Args, Debug)]
struct AssignmentsCommand {
    #[command(subcommand)]
    command: AssignmentsSubcommand,
}

#[derive(Subcommand, Debug)]
enum AssignmentsSubcommand {
    List {
        course_id: i64,
    },
    Show {
        assignment_id: i64,
    },
    Create {
        #[arg(long)]
        course_id: i64,
        #[arg(long)]
        title: String,
        #[arg(long, default_value = "")]
        description: String,
        #[arg(long, help = "ISO-8601 timestamp, e.g. 2025-03-01T23:59:00")]
        due_date: String,
        #[arg(long, default_value_t = 100)]
        max_score: i64,
    },
}

#[derive(Args, Debug)]
struct SubmissionsCommand {
    #[command(subcommand)]
    command: SubmissionsSubcommand,
}

#[derive(Subcommand, Debug)]
enum SubmissionsSubcommand {
    List {
        assignment_id: i64,
    },
    Create {
        assignment_id: i64,
        #[arg(long)]
        content: String,
    },
}

#[tokio::main]
async fn main() -> Result<(), CliError> {
    tracing_subscriber::fmt().with_writer(std::io::stderr).init();
    if let Err(e) = dotenvy::dotenv() {
        tracing::debug!(error = %e, "no .env file loaded");
    }

    let cli = Cli::parse();
    let config = ClientConfig::from_env_with(|key| match key {
        "CLASSROOM_API_URL" => cli.api_url.clone(),
        "CLASSROOM_TOKEN_PATH" => cli.token_path.as_ref().map(|p| p.to_string_lossy().into_owned()),
        _ => None,
    })?;

    let mut session = SessionStore::from_config(&config)?;
    match cli.command {
        Command::Login { email, password } => {
            let identity = session.login(&email, &password).await?;
            print_json(&identity)
        }
        Command::Register { email, password, full_name, role } => {
            let identity = session.register(&email, &password, &full_name, role).await?;
            print_json(&identity)
        }
        Command::Logout => {
            session.logout();
            println!("logged out");
            Ok(())
        }
        Command::Whoami => {
            session.restore().await;
            let identity = session.identity().ok_or(CliError::NotLoggedIn)?;
            print_json(&identity)
        }
        Command::Open { path } => {
            session.restore().await;
            run_open(&session, &path);
            Ok(())
        }
        Command::Courses(courses) => {
            let client = authenticated_client(&mut session, &config).await?;
            run_courses(&client, &session, courses.command).await
        }
        Command::Assignments(assignments) => {
            let client = authenticated_client(&mut session, &config).await?;
            run_assignments(&client, &session, assignments.command).await
        }
        Command::Submissions(submissions) => {
            let client = authenticated_client(&mut session, &config).await?;
            run_submissions(&client, &session, submissions.command).await
        }
        Command::Recommendations => {
            let client = authenticated_client(&mut session, &config).await?;
            print_json(&client.recommendations(&session).await?)
        }
    }
}

/// Restore the stored session and build a REST client for it.
async fn authenticated_client(session: &mut SessionStore, config: &ClientConfig) -> Result<ClassroomClient, CliError> {
    session.restore().await;
    if session.identity().is_none() {
        return Err(CliError::NotLoggedIn);
    }
    Ok(ClassroomClient::new(config)?)
}

fn run_open(session: &SessionStore, path: &str) {
    let state = session.state();
    let requested = Route::parse(path);
    match guard::evaluate(&state, requested) {
        Outcome::Wait => println!("wait {requested}"),
        Outcome::Render => println!("render {requested}"),
        Outcome::RedirectTo(next) => {
            let (landed, outcome) = guard::resolve(&state, next);
            let verb = if outcome == Outcome::Wait { "wait" } else { "render" };
            println!("redirect {requested} -> {verb} {landed}");
        }
    }
}

async fn run_courses(client: &ClassroomClient, session: &SessionStore, command: CoursesSubcommand) -> Result<(), CliError> {
    match command {
        CoursesSubcommand::List => print_json(&client.courses(session).await?),
        CoursesSubcommand::Browse => print_json(&client.browse_courses(session).await?),
        CoursesSubcommand::Show { course_id } => print_json(&client.course(session, course_id).await?),
        CoursesSubcommand::Status { course_id } => {
            let enrolled = client.enrollment_status(session, course_id).await?;
            print_json(&serde_json::json!({ "course_id": course_id, "enrolled": enrolled }))
        }
        CoursesSubcommand::Create { title, description, subject } => {
            let course = NewCourse { title, description, subject };
            print_json(&client.create_course(session, &course).await?)
        }
        CoursesSubcommand::Enroll { course_id } => {
            let message = client.enroll(session, course_id).await?;
            println!("{}", message.unwrap_or_else(|| format!("enrolled in course {course_id}")));
            Ok(())
        }
    }
}

async fn run_assignments(
    client: &ClassroomClient,
    session: &SessionStore,
    command: AssignmentsSubcommand,
) -> Result<(), CliError> {
    match command {
        AssignmentsSubcommand::List { course_id } => print_json(&client.assignments(session, course_id).await?),
        AssignmentsSubcommand::Show { assignment_id } => print_json(&client.assignment(session, assignment_id).await?),
        AssignmentsSubcommand::Create { course_id, title, description, due_date, max_score } => {
            let assignment = NewAssignment { course_id, title, description, due_date, max_score };
            print_json(&client.create_assignment(session, &assignment).await?)
        }
    }
}

async fn run_submissions(
    client: &ClassroomClient,
    session: &SessionStore,
    command: SubmissionsSubcommand,
) -> Result<(), CliError> {
    match command {
        SubmissionsSubcommand::List { assignment_id } => print_json(&client.submissions(session, assignment_id).await?),
        SubmissionsSubcommand::Create { assignment_id, content } => {
            let submission = NewSubmission { assignment_id, content };
            print_json(&client.submit(session, &submission).await?)
        }
    }
}

fn print_json<T: Serialize>(value: &T) -> Result<(), CliError> {
    let rendered = serde_json::to_string_pretty(value)?;
    println!("{rendered}");
    Ok(())
}
