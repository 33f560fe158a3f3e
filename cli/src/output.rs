use colored::*;

use portal_auth::{DenyReason, Session};
use portal_core::{Course, Grade, Pagination, User};

pub fn print_success(message: &str) {
    println!("{} {}", "✓".green().bold(), message);
}

pub fn print_warning(message: &str) {
    eprintln!("{} {}", "!".yellow().bold(), message);
}

pub fn print_error(message: &str) {
    eprintln!("{} {}", "Error:".red().bold(), message);
}

pub fn print_heading(title: &str) {
    println!("{}", title.cyan().bold());
}

/// Shown when the API refused the stored credential and the session was dropped
pub fn print_forced_logout_hint() {
    print_warning("Your session is no longer accepted by the portal and has been closed.");
    eprintln!("  Log in again with {}", "portal login".green().bold());
}

pub fn print_redirect(to: &str, reason: &DenyReason) {
    print_warning(&format!("Access denied ({}), redirected to {}", reason, to.bold()));
    if *reason == DenyReason::Unauthenticated {
        eprintln!("  Log in with {}", "portal login".green().bold());
    }
}

pub fn describe_session(session: &Session) -> String {
    match session {
        Session::Authenticated { principal, .. } => format!(
            "{} <{}> as {}",
            principal.name.bold(),
            principal.email,
            principal.role.to_string().cyan()
        ),
        Session::Unauthenticated | Session::Uninitialized => "not logged in".dimmed().to_string(),
    }
}

/// Align `rows` under `headers`, bold header and a dimmed rule below it
pub fn table(headers: &[&str], rows: &[Vec<String>]) -> String {
    let mut widths: Vec<usize> = headers.iter().map(|h| h.chars().count()).collect();
    for row in rows {
        for (i, cell) in row.iter().enumerate() {
            if i < widths.len() {
                widths[i] = widths[i].max(cell.chars().count());
            }
        }
    }

    let mut output = String::new();
    for (i, header) in headers.iter().enumerate() {
        let padding = widths[i] - header.chars().count();
        output.push_str(&format!("{}{} ", header.bold(), " ".repeat(padding)));
    }
    output = output.trim_end().to_string();
    output.push('\n');

    let rule: Vec<String> = widths.iter().map(|w| "─".repeat(*w)).collect();
    output.push_str(&rule.join(" ").dimmed().to_string());
    output.push('\n');

    for row in rows {
        let mut line = String::new();
        for (i, cell) in row.iter().enumerate().take(widths.len()) {
            let padding = widths[i] - cell.chars().count();
            line.push_str(&format!("{}{} ", cell, " ".repeat(padding)));
        }
        output.push_str(line.trim_end());
        output.push('\n');
    }
    output
}

pub fn print_users(users: &[User]) {
    if users.is_empty() {
        println!("{}", "No users.".dimmed());
        return;
    }
    let rows: Vec<Vec<String>> = users
        .iter()
        .map(|u| vec![u.id.clone(), u.name.clone(), u.email.clone(), u.role.to_string()])
        .collect();
    print!("{}", table(&["ID", "Name", "Email", "Role"], &rows));
}

pub fn print_user(user: &User) {
    println!("{} {}", "Name: ".bold(), user.name);
    println!("{} {}", "Email:".bold(), user.email);
    println!("{} {}", "Role: ".bold(), user.role.to_string().cyan());
    println!("{} {}", "ID:   ".bold(), user.id);
    if let Some(created) = user.created_at {
        println!("{} {}", "Since:".bold(), created.format("%Y-%m-%d"));
    }
    if let Some(teaching) = &user.courses_teaching {
        let names: Vec<&str> = teaching.iter().map(|c| c.name.as_str()).collect();
        println!("{} {}", "Teaches:".bold(), names.join(", "));
    }
    if let Some(enrolled) = &user.courses_enrolled {
        println!("{} {}", "Enrolled in:".bold(), enrolled.len());
    }
}

pub fn print_courses(courses: &[Course]) {
    if courses.is_empty() {
        println!("{}", "No courses.".dimmed());
        return;
    }
    let rows: Vec<Vec<String>> = courses
        .iter()
        .map(|c| vec![c.id.clone(), c.name.clone(), c.professor_id.clone()])
        .collect();
    print!("{}", table(&["ID", "Course", "Professor"], &rows));
}

pub fn print_course(course: &Course) {
    println!("{} {}", course.name.bold(), format!("#{}", course.id).dimmed());
    println!("Professor: {}", course.professor_id);
}

pub fn print_pagination(pagination: &Pagination) {
    println!(
        "{}",
        format!(
            "page {}/{} ({} courses)",
            pagination.page, pagination.total_pages, pagination.total_items
        )
        .dimmed()
    );
}

pub fn print_grades(grades: &[Grade]) {
    if grades.is_empty() {
        println!("{}", "No grades.".dimmed());
        return;
    }
    let rows: Vec<Vec<String>> = grades
        .iter()
        .map(|g| {
            vec![
                g.id.clone(),
                g.course_name.clone().unwrap_or_else(|| g.course_id.clone()),
                g.student_id.clone(),
                g.grade_name.clone().unwrap_or_default(),
                format!("{:.2}", g.grade),
            ]
        })
        .collect();
    print!("{}", table(&["ID", "Course", "Student", "Label", "Grade"], &rows));
}
