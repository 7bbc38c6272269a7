use anyhow::{anyhow, Context, Result};
use chrono::{Local, NaiveDate};
use clap::{Parser, Subcommand};
use futures::future::{AbortHandle, Abortable};
use std::future::Future;
use std::path::PathBuf;
use tracing::{info, warn};

use edupal_roster::api::{AiClient, ApiClient};
use edupal_roster::calendar;
use edupal_roster::cards::{render, Card};
use edupal_roster::config;
use edupal_roster::session::{
    AssistantScreen, ClassScreen, ClassesScreen, StudentScreen, StudentsScreen, SUGGESTED_PROMPTS,
};

#[derive(Debug, Parser)]
#[command(author, version, about = "Teacher roster client")]
struct Args {
    /// Path to YAML config file
    #[arg(long, default_value = "config.yaml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// List classes
    Classes,
    /// Aggregate students across every class
    Students {
        /// Case-insensitive filter on student, class or subject
        #[arg(long, default_value = "")]
        search: String,
        /// Fetch class details concurrently (overrides config)
        #[arg(long)]
        concurrent: bool,
    },
    /// Show one class with its topics
    Class {
        id: i64,
        /// Only show topics from this week
        #[arg(long)]
        week: Option<u32>,
    },
    /// Show one student's profile
    Student { id: i64 },
    /// Ask the educator assistant
    Ask {
        /// Prompt text; omit to use --suggestion
        prompt: Vec<String>,
        /// Use one of the canned prompts (0-3)
        #[arg(long)]
        suggestion: Option<usize>,
    },
    /// Show this week's events
    Calendar {
        /// Any day of the week to show (defaults to today)
        #[arg(long)]
        date: Option<NaiveDate>,
    },
    /// Print an example config file
    ConfigExample,
}

/// Run a screen load, abandoning it if Ctrl-C arrives first.
async fn until_teardown<F: Future>(fut: F) -> Result<F::Output> {
    let (handle, registration) = AbortHandle::new_pair();
    let watcher = tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            handle.abort();
        }
    });
    let res = Abortable::new(fut, registration).await;
    watcher.abort();
    res.map_err(|_| anyhow!("load cancelled"))
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_target(false)
        .compact()
        .init();

    let args = Args::parse();

    match args.command {
        Command::ConfigExample => {
            print!("{}", config::example());
            return Ok(());
        }
        Command::Calendar { date } => {
            let today = date.unwrap_or_else(|| Local::now().date_naive());
            let events = calendar::sample_events();
            let this_week = calendar::events_in_week(&events, today);
            let assessments = this_week.iter().filter(|e| e.kind.is_assessment()).count();
            println!(
                "{} events this week ({} assessments)",
                this_week.len(),
                assessments
            );
            for day in calendar::week_of(today) {
                let marker = if day == today { "*" } else { " " };
                println!("{} {}", marker, day.format("%a %b %-d"));
                for event in calendar::events_on(&events, day) {
                    println!("    {}", render(&Card::from(event)));
                }
            }
            return Ok(());
        }
        _ => {}
    }

    let cfg = config::load(Some(&args.config))
        .with_context(|| format!("failed to load {}", args.config.display()))?;
    let api = ApiClient::from_config(&cfg)?;
    info!(base_url = %api.base_url(), "using backend");

    match args.command {
        Command::Classes => {
            let mut screen = ClassesScreen::default();
            if until_teardown(screen.refresh(&api)).await?.is_err() {
                return Err(anyhow!(screen.alert().unwrap_or_default().to_string()));
            }
            if screen.classes().is_empty() {
                println!("No classes yet.");
            }
            for class in screen.classes() {
                println!("{}", render(&Card::from(class)));
            }
        }
        Command::Students { search, concurrent } => {
            let mut screen = StudentsScreen::new(concurrent || cfg.roster.concurrent_fetch);
            if until_teardown(screen.refresh(&api)).await?.is_err() {
                return Err(anyhow!(screen.alert().unwrap_or_default().to_string()));
            }
            if !screen.skipped_classes().is_empty() {
                warn!(skipped = ?screen.skipped_classes(), "some classes could not be loaded");
            }
            screen.set_query(search);
            let stats = screen.stats();
            println!(
                "{} students · {} classes · {} per class",
                stats.total_students, stats.total_classes, stats.average_per_class
            );
            let visible = screen.visible();
            if visible.is_empty() {
                println!("{}", screen.empty_message());
            }
            for entry in &visible {
                println!("{}", render(&Card::from(entry)));
            }
        }
        Command::Class { id, week } => {
            let mut screen = ClassScreen::new(id);
            if until_teardown(screen.refresh(&api)).await?.is_err() {
                return Err(anyhow!(screen.alert().unwrap_or_default().to_string()));
            }
            let (Some(detail), Some(overview)) = (screen.detail(), screen.overview()) else {
                println!("Class not found");
                return Ok(());
            };
            println!("{} · {}", detail.name, detail.subject);
            println!(
                "{} students · {} topics",
                overview.student_count, overview.topic_count
            );
            for student in &overview.preview {
                println!("  {}", student.name);
            }
            if let Some(total) = overview.view_all {
                println!("  View all {} students", total);
            }
            screen.select_week(week);
            let weeks: Vec<String> = screen.weeks().iter().map(|w| w.to_string()).collect();
            println!("Weeks: {}", weeks.join(", "));
            let topics = screen.visible_topics();
            if topics.is_empty() {
                println!("{}", screen.empty_message());
            }
            for topic in &topics {
                println!("{}", render(&Card::from(topic)));
            }
        }
        Command::Student { id } => {
            let mut screen = StudentScreen::new(id);
            if until_teardown(screen.refresh(&api)).await?.is_err() {
                return Err(anyhow!(screen.alert().unwrap_or_default().to_string()));
            }
            let Some(profile) = screen.profile() else {
                println!("Student not found");
                return Ok(());
            };
            println!("{}", profile.name);
            if let (Some(class), Some(subject)) = (&profile.class_name, &profile.class_subject) {
                println!("{} · {}", class, subject);
            }
            println!(
                "Attendance {}% · GPA {} · {} grades",
                profile.attendance_rate,
                profile.grade_average_label(),
                profile.grade_count
            );
            if profile.attendance.is_empty() {
                println!("No attendance records");
            }
            for record in &profile.attendance {
                println!("  {} {}", record.date.format("%-d/%-m"), record.status.as_str());
            }
            if profile.recent_grades.is_empty() {
                println!("No grades recorded");
            }
            for grade in &profile.recent_grades {
                let subject: String = grade.subject.chars().take(8).collect();
                println!("  {} {}", grade.grade.as_str(), subject);
            }
            if profile.comments.is_empty() {
                println!("No comments added");
            }
            for comment in &profile.comments {
                match comment.created_at {
                    Some(at) => println!("  [{}] {}", at.format("%Y-%m-%d"), comment.comment_text),
                    None => println!("  {}", comment.comment_text),
                }
            }
        }
        Command::Ask { prompt, suggestion } => {
            let ai = AiClient::from_config(&cfg)?;
            let mut screen = AssistantScreen::default();
            match suggestion {
                Some(i) if i < SUGGESTED_PROMPTS.len() => screen.use_suggestion(i),
                Some(i) => return Err(anyhow!("no suggested prompt {}", i)),
                None => screen.set_input(prompt.join(" ")),
            }
            if screen.input().trim().is_empty() {
                for (i, s) in SUGGESTED_PROMPTS.iter().enumerate() {
                    println!("{}: {} - {}", i, s.title, s.subtitle);
                }
                return Ok(());
            }
            if until_teardown(screen.send(&ai)).await?.is_err() {
                return Err(anyhow!(screen.alert().unwrap_or_default().to_string()));
            }
            println!("{}", screen.response());
        }
        Command::ConfigExample | Command::Calendar { .. } => {}
    }

    Ok(())
}
