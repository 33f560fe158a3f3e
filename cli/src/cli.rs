use clap::{Args as ClapArgs, Parser, Subcommand};
use std::path::PathBuf;

/// Command-line client for the university portal
#[derive(Parser, Debug)]
#[command(name = "portal", author, version, about, long_about = None)]
pub struct Args {
    /// Path to the configuration file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Base URL of the portal API, e.g. http://127.0.0.1:5000/api/v1
    #[arg(long, global = true, env = "PORTAL_API_URL")]
    pub api_url: Option<String>,

    /// Log filter (trace, debug, info, warn, error or a full EnvFilter directive)
    #[arg(long, global = true, env = "PORTAL_LOG")]
    pub log_level: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Log in and remember the session
    Login {
        /// Account email, prompted when omitted
        #[arg(short, long)]
        email: Option<String>,
        /// Account password, prompted when omitted
        #[arg(short, long, env = "PORTAL_PASSWORD", hide_env_values = true)]
        password: Option<String>,
    },

    /// Forget the current session
    Logout,

    /// Show who is logged in
    Whoami,

    /// List the portal's views and who may open them
    Routes,

    /// Open a view, e.g. `portal open /courses/3/grades`
    Open {
        #[arg(required = true)]
        path: String,
    },

    /// Create an account; anonymous registrations are students
    Register(RegisterArgs),

    /// Change the password of the logged-in account
    Passwd,

    /// Manage users (administrators)
    #[command(subcommand)]
    Users(UserCommand),

    /// Browse and manage courses
    #[command(subcommand)]
    Courses(CourseCommand),

    /// Browse and manage grades
    #[command(subcommand)]
    Grades(GradeCommand),

    /// Inspect or create the configuration file
    #[command(subcommand)]
    Config(ConfigCommand),
}

#[derive(ClapArgs, Debug)]
pub struct RegisterArgs {
    #[arg(long)]
    pub name: String,
    #[arg(long)]
    pub email: String,
    /// Administrator, Professor or Student
    #[arg(long, default_value = "Student")]
    pub role: String,
}

#[derive(Subcommand, Debug)]
pub enum UserCommand {
    List,
    Show {
        id: String,
    },
    Search {
        query: String,
    },
    Create(RegisterArgs),
    Update {
        id: String,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        email: Option<String>,
        #[arg(long)]
        role: Option<String>,
    },
    Delete {
        id: String,
        /// Skip the confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },
}

#[derive(Subcommand, Debug)]
pub enum CourseCommand {
    List {
        #[arg(long, default_value_t = 1)]
        page: u32,
        #[arg(long, default_value_t = 10)]
        per_page: u32,
    },
    Show {
        id: String,
    },
    Search {
        name: String,
    },
    /// Students enrolled in a course
    Students {
        id: String,
    },
    Create {
        name: String,
    },
    Update {
        id: String,
        name: String,
    },
    Delete {
        id: String,
        #[arg(short, long)]
        yes: bool,
    },
    Join {
        id: String,
    },
    Leave {
        id: String,
    },
}

#[derive(Subcommand, Debug)]
pub enum GradeCommand {
    List,
    Show {
        id: String,
    },
    /// Grades of one student in one course
    Student {
        course_id: String,
        student_id: String,
    },
    Assign {
        course_id: String,
        student_id: String,
        grade: f64,
        /// Label of the grade, e.g. "Midterm"
        #[arg(long)]
        name: String,
    },
    Update {
        id: String,
        grade: f64,
    },
    Delete {
        id: String,
        #[arg(short, long)]
        yes: bool,
    },
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommand {
    /// Print the effective configuration
    Show,
    /// Write a configuration file with the current settings
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}
