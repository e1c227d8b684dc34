// study-recommend - tells a student what to practice next
//
// This is the main entry point. Parses CLI args and dispatches to handlers.

use anyhow::{bail, Context, Result};
use std::env;
use std::path::PathBuf;
use std::sync::Arc;
use study_recommend_lib::{
    core::Importer, Database, RecommendError, Recommender, RecommenderConfig,
};

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let args: Vec<String> = env::args().collect();

    if args.len() < 2 {
        print_usage();
        return Ok(());
    }

    let command = &args[1];

    match command.as_str() {
        "recommend" => handle_recommend(&args[2..]).await,
        "profile" => handle_profile(&args[2..]).await,
        "import" => handle_import(&args[2..]).await,
        "status" => handle_status().await,
        "version" | "-v" | "--version" => {
            println!("study-recommend v{}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
        "help" | "-h" | "--help" => {
            print_usage();
            Ok(())
        }
        _ => {
            eprintln!("Unknown command: {}", command);
            print_usage();
            Ok(())
        }
    }
}

/// Flags shared by `recommend` and `profile`
#[derive(Debug, Default)]
struct RequestArgs {
    student_id: Option<String>,
    subject: Option<String>,
    limit: Option<i64>,
    explain: bool,
    json: bool,
}

fn parse_request_args(args: &[String]) -> Result<RequestArgs> {
    let mut parsed = RequestArgs::default();

    let mut i = 0;
    while i < args.len() {
        match args[i].as_str() {
            "--subject" => {
                i += 1;
                parsed.subject = args.get(i).cloned();
            }
            "--limit" => {
                i += 1;
                let raw = args.get(i).context("--limit needs a number")?;
                parsed.limit = Some(
                    raw.parse::<i64>()
                        .with_context(|| format!("--limit expects a number, got '{}'", raw))?,
                );
            }
            "--explain" => parsed.explain = true,
            "--json" => parsed.json = true,
            arg if parsed.student_id.is_none() => parsed.student_id = Some(arg.to_string()),
            arg => bail!("Unexpected argument: {}", arg),
        }
        i += 1;
    }

    Ok(parsed)
}

async fn handle_recommend(args: &[String]) -> Result<()> {
    let request = parse_request_args(args)?;
    let Some(student_id) = request.student_id.as_deref() else {
        eprintln!("Error: No student id provided");
        return Ok(());
    };

    let recommender = get_recommender().await?;
    let limit = request
        .limit
        .unwrap_or(recommender.config().default_limit);

    let ranked = match recommender
        .explain_recommendations(student_id, request.subject.as_deref(), limit)
        .await
    {
        Ok(ranked) => ranked,
        Err(e) => exit_on_client_error(e)?,
    };

    if request.json {
        if request.explain {
            println!("{}", serde_json::to_string_pretty(&ranked)?);
        } else {
            let questions: Vec<_> = ranked.iter().map(|c| &c.question).collect();
            println!("{}", serde_json::to_string_pretty(&questions)?);
        }
        return Ok(());
    }

    if ranked.is_empty() {
        println!("No questions to recommend.");
        return Ok(());
    }

    println!("\nRecommended for {}:", student_id);
    println!("{}", "=".repeat(60));
    for (i, candidate) in ranked.iter().enumerate() {
        let q = &candidate.question;
        println!(
            "{:3}. {} - {} ch.{} ({}, {}) score {:.3}",
            i + 1,
            q.id,
            q.course_name,
            q.chapter,
            q.difficulty,
            q.question_type,
            candidate.score
        );

        if request.explain {
            let b = &candidate.breakdown;
            println!(
                "       difficulty {:.2} | type {:.2} | subject {:.2} | progress {:.2}",
                b.difficulty_match, b.type_preference, b.subject_preference, b.progress_alignment
            );
            println!(
                "       type success {:.2} | subject success {:.2} | attempted {:.2}",
                b.type_success, b.subject_success, b.attempt_penalty
            );
        }
    }
    println!("{}", "=".repeat(60));

    Ok(())
}

async fn handle_profile(args: &[String]) -> Result<()> {
    let request = parse_request_args(args)?;
    let Some(student_id) = request.student_id.as_deref() else {
        eprintln!("Error: No student id provided");
        return Ok(());
    };

    let recommender = get_recommender().await?;
    let profile = match recommender
        .profile(student_id, request.subject.as_deref())
        .await
    {
        Ok(profile) => profile,
        Err(e) => exit_on_client_error(e)?,
    };

    if request.json {
        println!("{}", serde_json::to_string_pretty(&profile)?);
        return Ok(());
    }

    println!("\nProfile for {}", student_id);
    println!("{}", "=".repeat(60));
    println!("  Average score:        {:.1}", profile.average_score);
    println!("  Preferred difficulty: {}", profile.preferred_difficulty);
    println!(
        "  Preferred types:      {}",
        profile
            .preferred_types
            .iter()
            .map(|t| t.to_string())
            .collect::<Vec<_>>()
            .join(", ")
    );
    println!(
        "  Preferred subjects:   {}",
        profile.preferred_subjects.join(", ")
    );

    if !profile.course_progress.is_empty() {
        println!("\nCourse progress:");
        for (course, percent) in &profile.course_progress {
            println!("  {:<14} {:>5.1}%", course, percent);
        }
    }

    println!("\nSuccess rate by type:");
    for (question_type, rate) in profile.success_rate_by_type.iter() {
        println!("  {:<14} {:>5.0}%", question_type.to_string(), rate * 100.0);
    }
    println!("{}", "=".repeat(60));

    Ok(())
}

async fn handle_import(args: &[String]) -> Result<()> {
    let Some(path) = args.first() else {
        eprintln!("Error: No seed file provided");
        return Ok(());
    };

    let db = Arc::new(get_database().await?);
    let importer = Importer::new(db);

    let report = match importer.import_file(path).await {
        Ok(report) => report,
        Err(e) => exit_on_client_error(e)?,
    };

    println!("Imported from {}:", path);
    println!("  Questions: {}", report.questions);
    println!("  Solved:    {}", report.solved);
    println!("  Attempts:  {}", report.attempts);
    println!("  At:        {}", report.imported_at);

    Ok(())
}

async fn handle_status() -> Result<()> {
    let db = get_database().await?;
    let stats = db.stats().await?;
    let config = load_config()?;

    println!("\nstudy-recommend Status");
    println!("{}", "=".repeat(60));
    println!("\nDatabase: {}", db.path().display());
    println!("  Questions: {}", stats.total_questions);
    println!("  Solved:    {}", stats.total_solved);
    println!("  Attempts:  {}", stats.total_attempts);
    println!("  Students:  {}", stats.total_students);
    println!(
        "  Pool:      {} connection(s), {} idle",
        stats.pool_size, stats.idle_connections
    );

    println!("\nConfiguration:");
    println!("  Subjects:      {}", config.known_subjects.join(", "));
    println!("  Default limit: {}", config.default_limit);
    println!("  Chapters:      {}", config.chapters_per_course);
    println!("{}", "=".repeat(60));

    db.close().await;
    Ok(())
}

/// Bad input gets a plain message and exit code 2, everything else propagates
fn exit_on_client_error<T>(e: RecommendError) -> Result<T> {
    if e.is_client_error() {
        eprintln!("Error: {}", e.user_message());
        std::process::exit(2);
    }

    Err(e.into())
}

fn data_dir() -> Result<PathBuf> {
    let home = dirs::home_dir().context("Could not find home directory")?;
    Ok(home.join(".study-recommend"))
}

fn load_config() -> Result<RecommenderConfig> {
    let path = match env::var_os("STUDY_RECOMMEND_CONFIG") {
        Some(path) => PathBuf::from(path),
        None => data_dir()?.join("config.json"),
    };

    RecommenderConfig::load_or_default(&path)
        .with_context(|| format!("Failed to load config from {}", path.display()))
}

async fn get_database() -> Result<Database> {
    let path = match env::var_os("STUDY_RECOMMEND_DB") {
        Some(path) => PathBuf::from(path),
        None => data_dir()?.join("history.db"),
    };

    Database::new(&path)
        .await
        .with_context(|| format!("Failed to open database at {}", path.display()))
}

async fn get_recommender() -> Result<Recommender> {
    let config = load_config()?;
    let db = Arc::new(get_database().await?);
    Ok(Recommender::new(db, config))
}

fn print_usage() {
    println!(
        r#"study-recommend v{} - practice questions picked for each student

USAGE:
    study-recommend <COMMAND> [OPTIONS]

COMMANDS:
    recommend <student-id>   Recommend questions
        --subject <name>     Only this subject
        --limit <n>          How many (default: 5)
        --explain            Show the score breakdown
        --json               Print JSON
    profile <student-id>     Show the student's performance profile
        --subject <name>     Scope course progress to one subject
        --json               Print JSON
    import <seed.json>       Load questions and history from a seed file
    status                   Show database and config summary
    version                  Show version
    help                     Show this help

ENVIRONMENT:
    STUDY_RECOMMEND_DB       Database path (default: ~/.study-recommend/history.db)
    STUDY_RECOMMEND_CONFIG   Config path (default: ~/.study-recommend/config.json)
    RUST_LOG                 Log level (default: warn)

EXAMPLES:
    study-recommend import seed.json
    study-recommend recommend student-42 --subject Mathematics --limit 10
    study-recommend profile student-42
"#,
        env!("CARGO_PKG_VERSION")
    );
}
