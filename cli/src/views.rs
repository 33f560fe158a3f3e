//! Terminal rendering of the portal's views.
//!
//! Only reached after the access guard allowed the navigation, so every view
//! can rely on the session it is handed. What a view shows still depends on
//! the role: a professor's course page lists the enrolled students, a
//! student's lists their own grades.

use anyhow::{Context, Result};
use colored::*;

use portal_auth::{RouteMatch, Session, View};
use portal_client::Portal;
use portal_core::{Principal, Role};

use crate::output::{
    describe_session, print_course, print_courses, print_grades, print_heading,
    print_pagination, print_user, print_users,
};

pub async fn render(portal: &Portal, matched: &RouteMatch, session: &Session) -> Result<()> {
    match matched.view {
        View::Home => home(session),
        View::Login => {
            println!("Log in with {}", "portal login".green().bold());
            Ok(())
        }
        View::Profile => profile(portal, principal(session)?).await,
        View::Dashboard => dashboard(portal, principal(session)?).await,
        View::UsersList => {
            print_heading("Users");
            print_users(&portal.api().list_users().await?);
            Ok(())
        }
        View::UserDetails => {
            let user = portal.api().get_user(param(matched)?).await?;
            print_user(&user);
            Ok(())
        }
        View::CoursesList => {
            let page = portal.api().list_courses(1, 10).await?;
            print_heading("Courses");
            print_courses(&page.courses);
            if let Some(pagination) = &page.pagination {
                print_pagination(pagination);
            }
            Ok(())
        }
        View::CourseDetails => course(portal, param(matched)?, principal(session)?).await,
        View::GradesManagement => grades(portal, param(matched)?, principal(session)?).await,
    }
}

fn principal(session: &Session) -> Result<&Principal> {
    session
        .principal()
        .context("view requires an authenticated session")
}

fn param(matched: &RouteMatch) -> Result<&str> {
    matched
        .param("id")
        .with_context(|| format!("route {} has no :id parameter", matched.pattern))
}

fn home(session: &Session) -> Result<()> {
    print_heading("University portal");
    println!("Session: {}", describe_session(session));
    if !session.is_authenticated() {
        println!("Log in with {}", "portal login".green().bold());
    }
    Ok(())
}

async fn profile(portal: &Portal, me: &Principal) -> Result<()> {
    print_heading("Profile");
    let user = portal.api().get_user(&me.id).await?;
    print_user(&user);
    Ok(())
}

async fn dashboard(portal: &Portal, me: &Principal) -> Result<()> {
    print_heading(&format!("Dashboard of {}", me.name));

    match me.role {
        Role::Administrator => {
            let users = portal.api().list_users().await?;
            for role in Role::ALL {
                let count = users.iter().filter(|u| u.role == role).count();
                println!("{:<14} {}", role.to_string(), count);
            }
            let page = portal.api().list_courses(1, 10).await?;
            println!();
            print_heading("Recent courses");
            print_courses(&page.courses);
        }
        Role::Professor => {
            let page = portal.api().list_courses(1, 100).await?;
            let teaching: Vec<_> = page
                .courses
                .into_iter()
                .filter(|c| c.professor_id == me.id)
                .collect();
            print_heading("Courses you teach");
            print_courses(&teaching);
        }
        Role::Student => {
            print_heading("Your grades");
            print_grades(&portal.api().list_grades().await?);
        }
    }
    Ok(())
}

async fn course(portal: &Portal, course_id: &str, me: &Principal) -> Result<()> {
    let course = portal.api().get_course(course_id).await?;
    print_course(&course);
    println!();

    match me.role {
        Role::Administrator | Role::Professor => {
            print_heading("Enrolled students");
            print_users(&portal.api().course_students(course_id).await?);
        }
        Role::Student => {
            print_heading("Your grades");
            print_grades(&portal.api().student_grades(course_id, &me.id).await?);
        }
    }
    Ok(())
}

async fn grades(portal: &Portal, course_id: &str, me: &Principal) -> Result<()> {
    let course = portal.api().get_course(course_id).await?;
    print_heading(&format!("Grades for {}", course.name));

    if me.role == Role::Student {
        print_grades(&portal.api().student_grades(course_id, &me.id).await?);
        return Ok(());
    }

    let students = portal.api().course_students(course_id).await?;
    if students.is_empty() {
        println!("{}", "No students enrolled.".dimmed());
    }
    for student in students {
        println!();
        println!("{} {}", student.name.bold(), format!("#{}", student.id).dimmed());
        print_grades(&portal.api().student_grades(course_id, &student.id).await?);
    }
    Ok(())
}
