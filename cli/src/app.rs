use anyhow::{bail, Context, Result};
use colored::*;
use dialoguer::{Confirm, Input, Password};
use indicatif::{ProgressBar, ProgressStyle};
use std::path::Path;
use std::time::Duration;

use portal_auth::{evaluate, Navigation};
use portal_client::Portal;
use portal_core::{NewGrade, NewUser, PortalConfig, Role, UserUpdate};

use crate::cli::{Command, ConfigCommand, CourseCommand, GradeCommand, RegisterArgs, UserCommand};
use crate::output::{
    describe_session, print_course, print_courses, print_grades, print_heading,
    print_pagination, print_redirect, print_success, print_user, print_users, table,
};
use crate::views;

fn spinner(message: &str) -> ProgressBar {
    let spinner = ProgressBar::new_spinner();
    spinner.set_style(
        ProgressStyle::default_spinner()
            .tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏")
            .template("{spinner} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    spinner.set_message(message.to_string());
    spinner.enable_steady_tick(Duration::from_millis(120));
    spinner
}

fn confirmed(prompt: &str, yes: bool) -> Result<bool> {
    if yes {
        return Ok(true);
    }
    Confirm::new()
        .with_prompt(prompt)
        .default(false)
        .interact()
        .context("Failed to read confirmation")
}

/// Dispatch one command against a portal whose session was already restored
pub async fn run(portal: &Portal, command: Command) -> Result<()> {
    match command {
        Command::Login { email, password } => login(portal, email, password).await,
        Command::Logout => {
            portal.logout();
            print_success("Logged out");
            Ok(())
        }
        Command::Whoami => {
            println!("{}", describe_session(&portal.session()));
            Ok(())
        }
        Command::Routes => {
            routes(portal);
            Ok(())
        }
        Command::Open { path } => open(portal, &path).await,
        Command::Register(args) => register(portal, args).await,
        Command::Passwd => change_password(portal).await,
        Command::Users(command) => users(portal, command).await,
        Command::Courses(command) => courses(portal, command).await,
        Command::Grades(command) => grades(portal, command).await,
        Command::Config(_) => bail!("configuration commands do not need a portal session"),
    }
}

async fn login(portal: &Portal, email: Option<String>, password: Option<String>) -> Result<()> {
    let email = match email {
        Some(email) => email,
        None => Input::<String>::new()
            .with_prompt("Email")
            .interact_text()
            .context("Failed to read email")?,
    };
    let password = match password {
        Some(password) => password,
        None => Password::new()
            .with_prompt("Password")
            .interact()
            .context("Failed to read password")?,
    };

    let progress = spinner("Logging in...");
    let result = portal.login(&email, &password).await;
    progress.finish_and_clear();

    let session = result?;
    print_success(&format!("Logged in as {}", describe_session(&session)));
    Ok(())
}

fn routes(portal: &Portal) {
    let session = portal.session();
    let rows: Vec<Vec<String>> = portal
        .guard()
        .routes()
        .entries()
        .map(|(pattern, view, policy)| {
            let access = match policy {
                None => "public".to_string(),
                Some(policy) => policy
                    .allowed_roles()
                    .iter()
                    .map(Role::as_str)
                    .collect::<Vec<_>>()
                    .join(", "),
            };
            let open = policy.map_or(true, |policy| evaluate(policy, &session).is_allowed());
            let open = if open { "yes".green() } else { "no".red() };
            vec![pattern.to_string(), view.to_string(), access, open.to_string()]
        })
        .collect();

    print!("{}", table(&["Path", "View", "Roles", "Open"], &rows));
}

async fn open(portal: &Portal, path: &str) -> Result<()> {
    match portal.navigate(path) {
        Navigation::Render(matched) => views::render(portal, &matched, &portal.session()).await,
        Navigation::Redirect { to, reason } => {
            print_redirect(&to, &reason);
            Ok(())
        }
        Navigation::NotFound { path } => bail!("no page at {}", path),
    }
}

fn read_new_password() -> Result<String> {
    Password::new()
        .with_prompt("Password")
        .with_confirmation("Repeat password", "Passwords do not match")
        .interact()
        .context("Failed to read password")
}

fn new_user(args: RegisterArgs) -> Result<NewUser> {
    let role: Role = args.role.parse()?;
    Ok(NewUser {
        name: args.name,
        email: args.email,
        password: read_new_password()?,
        role,
    })
}

async fn register(portal: &Portal, args: RegisterArgs) -> Result<()> {
    let user = new_user(args)?;
    let id = portal.api().register(&user).await?;
    print_success(&format!("Account {} created (id {})", user.email, id));
    Ok(())
}

async fn change_password(portal: &Portal) -> Result<()> {
    let old = Password::new()
        .with_prompt("Current password")
        .interact()
        .context("Failed to read password")?;
    let new = Password::new()
        .with_prompt("New password")
        .with_confirmation("Repeat new password", "Passwords do not match")
        .interact()
        .context("Failed to read password")?;

    let message = portal.api().change_password(&old, &new).await?;
    print_success(&message);
    Ok(())
}

async fn users(portal: &Portal, command: UserCommand) -> Result<()> {
    let api = portal.api();
    match command {
        UserCommand::List => print_users(&api.list_users().await?),
        UserCommand::Show { id } => print_user(&api.get_user(&id).await?),
        UserCommand::Search { query } => print_users(&api.search_users(&query).await?),
        UserCommand::Create(args) => {
            let user = api.create_user(&new_user(args)?).await?;
            print_success(&format!("Created user {} (id {})", user.email, user.id));
        }
        UserCommand::Update {
            id,
            name,
            email,
            role,
        } => {
            let update = UserUpdate {
                name,
                email,
                role: role.as_deref().map(str::parse::<Role>).transpose()?,
            };
            let user = api.update_user(&id, &update).await?;
            print_success("User updated");
            print_user(&user);
        }
        UserCommand::Delete { id, yes } => {
            if confirmed(&format!("Delete user {}?", id), yes)? {
                print_success(&api.delete_user(&id).await?);
            }
        }
    }
    Ok(())
}

async fn courses(portal: &Portal, command: CourseCommand) -> Result<()> {
    let api = portal.api();
    match command {
        CourseCommand::List { page, per_page } => {
            let page = api.list_courses(page, per_page).await?;
            print_courses(&page.courses);
            if let Some(pagination) = &page.pagination {
                print_pagination(pagination);
            }
        }
        CourseCommand::Show { id } => print_course(&api.get_course(&id).await?),
        CourseCommand::Search { name } => print_courses(&api.search_courses(&name).await?),
        CourseCommand::Students { id } => {
            print_heading(&format!("Students of course {}", id));
            print_users(&api.course_students(&id).await?);
        }
        CourseCommand::Create { name } => {
            let course = api.create_course(&name).await?;
            print_success(&format!("Created course {} (id {})", course.name, course.id));
        }
        CourseCommand::Update { id, name } => {
            let course = api.update_course(&id, &name).await?;
            print_success(&format!("Course {} renamed to {}", course.id, course.name));
        }
        CourseCommand::Delete { id, yes } => {
            if confirmed(&format!("Delete course {}?", id), yes)? {
                print_success(&api.delete_course(&id).await?);
            }
        }
        CourseCommand::Join { id } => print_success(&api.join_course(&id).await?),
        CourseCommand::Leave { id } => print_success(&api.leave_course(&id).await?),
    }
    Ok(())
}

async fn grades(portal: &Portal, command: GradeCommand) -> Result<()> {
    let api = portal.api();
    match command {
        GradeCommand::List => print_grades(&api.list_grades().await?),
        GradeCommand::Show { id } => print_grades(&[api.get_grade(&id).await?]),
        GradeCommand::Student {
            course_id,
            student_id,
        } => print_grades(&api.student_grades(&course_id, &student_id).await?),
        GradeCommand::Assign {
            course_id,
            student_id,
            grade,
            name,
        } => {
            let grade = api
                .assign_grade(&NewGrade {
                    course_id,
                    student_id,
                    grade,
                    grade_name: name,
                })
                .await?;
            print_success("Grade assigned");
            print_grades(&[grade]);
        }
        GradeCommand::Update { id, grade } => {
            let grade = api.update_grade(&id, grade).await?;
            print_success("Grade updated");
            print_grades(&[grade]);
        }
        GradeCommand::Delete { id, yes } => {
            if confirmed(&format!("Delete grade {}?", id), yes)? {
                print_success(&api.delete_grade(&id).await?);
            }
        }
    }
    Ok(())
}

/// Configuration commands run without contacting the API
pub fn run_config(command: ConfigCommand, config: &PortalConfig, path: &Path) -> Result<()> {
    match command {
        ConfigCommand::Show => {
            print_heading(&format!("Configuration ({})", path.display()));
            println!("api_base_url    {}", config.api_base_url());
            println!("login_route     {}", config.login_route());
            println!("timeout         {}s", config.request_timeout().as_secs());
            println!("persist_session {}", config.persist_session());
            println!("session_file    {}", config.session_file()?.display());
            println!("log_level       {}", config.log_level());
            for route in &config.routes {
                let roles: Vec<&str> = route.allowed_roles.iter().map(Role::as_str).collect();
                println!("route           {} -> {}", route.path, roles.join(", "));
            }
        }
        ConfigCommand::Init { force } => {
            if path.exists() && !force {
                bail!("{} already exists, use --force to overwrite", path.display());
            }
            config.save_to_file(path)?;
            print_success(&format!("Wrote {}", path.display()));
        }
    }
    Ok(())
}
