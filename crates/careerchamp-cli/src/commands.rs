//! Command implementations.
//!
//! Each command works against one `Context`: the restored session and an API
//! client reading the same token store. A 401 from the backend ends the
//! session here, in the caller, never inside the client.

use std::io::{self, Write};
use std::path::Path;
use std::sync::Arc;

use anyhow::{bail, Context as _, Result};
use chrono::Utc;
use tracing::{info, warn};

use careerchamp_core::auth::{SessionController, SystemClock, TokenStore};
use careerchamp_core::interview::{self, Category, Question};
use careerchamp_core::models::{search_query, ChatReply};
use careerchamp_core::{ApiClient, ApiError, Config, SessionView};

/// Maximum password length accepted at the prompt.
const MAX_PASSWORD_LENGTH: usize = 128;

pub struct Context {
    pub config: Config,
    pub session: SessionController,
    pub api: ApiClient,
}

impl Context {
    /// Build the store, restore the session from it, and bind the API client
    /// to that session.
    pub fn new(config: Config, api_url: &str) -> Result<Self> {
        let store: Arc<dyn TokenStore> = config.token_store()?;
        let session =
            SessionController::with_clock(store, Arc::new(SystemClock), config.session_config());
        session.init();

        let api = ApiClient::with_session(api_url, &session)?;
        Ok(Self {
            config,
            session,
            api,
        })
    }

    /// End the session if the backend rejected the token.
    fn on_error(&self, error: anyhow::Error) -> anyhow::Error {
        let unauthorized = error
            .downcast_ref::<ApiError>()
            .map(ApiError::is_unauthorized)
            .unwrap_or(false);
        if unauthorized && self.session.is_authenticated() {
            warn!("Backend rejected the session token, logging out");
            if let Err(e) = self.session.logout() {
                warn!(error = %e, "Logout could not remove the stored token");
            }
            return error.context("Session expired, please log in again");
        }
        error
    }
}

fn prompt(label: &str) -> Result<String> {
    print!("{}: ", label);
    io::stdout().flush()?;

    let mut input = String::new();
    io::stdin().read_line(&mut input)?;
    Ok(input.trim().to_string())
}

fn prompt_password() -> Result<String> {
    let password = rpassword::prompt_password("Password: ")?;
    if password.is_empty() {
        bail!("Password required");
    }
    if password.chars().count() > MAX_PASSWORD_LENGTH {
        bail!("Password longer than {} characters", MAX_PASSWORD_LENGTH);
    }
    Ok(password)
}

fn describe(view: &SessionView) -> String {
    match &view.claims {
        Some(claims) if view.is_authenticated => {
            let minutes = claims.seconds_until_expiry(Utc::now()) / 60;
            format!("Logged in as {} (expires in {} min)", claims.sub, minutes)
        }
        _ if view.is_loading => "Restoring session...".to_string(),
        _ => "Not logged in".to_string(),
    }
}

// ===== Account =====

pub async fn login(ctx: &Context, email: Option<String>) -> Result<()> {
    let email = match email.or_else(|| ctx.config.last_email.clone()) {
        Some(email) if !email.is_empty() => email,
        _ => prompt("Email")?,
    };
    if email.is_empty() {
        bail!("Email required");
    }
    let password = prompt_password()?;

    eprintln!("Authenticating...");
    let response = ctx.api.login(&email, &password).await?;
    let claims = ctx
        .session
        .login(response.access_token.as_str())
        .context("Backend returned an unusable token")?;

    let mut config = ctx.config.clone();
    config.last_email = Some(email);
    if let Err(e) = config.save() {
        warn!(error = %e, "Failed to save config");
    }

    info!(sub = %claims.sub, "Login successful");
    println!("{}", describe(&ctx.session.view()));
    Ok(())
}

pub async fn register(ctx: &Context, username: &str, email: &str) -> Result<()> {
    let password = prompt_password()?;
    let response = ctx.api.register(username, email, &password).await?;

    if let Some(message) = response.message {
        println!("{}", message);
    }
    match response.access_token {
        Some(token) => {
            ctx.session
                .login(token.as_str())
                .context("Backend returned an unusable token")?;
            println!("{}", describe(&ctx.session.view()));
        }
        None => println!("Account created. Run `careerchamp login --email {}` to sign in.", email),
    }
    Ok(())
}

pub fn logout(ctx: &Context) -> Result<()> {
    ctx.session
        .logout()
        .context("Logged out, but the stored token could not be removed")?;
    println!("Logged out");
    Ok(())
}

pub fn status(ctx: &Context, json: bool) -> Result<()> {
    let view = ctx.session.view();
    if json {
        println!("{}", serde_json::to_string_pretty(&view)?);
    } else {
        println!("{}", describe(&view));
    }
    Ok(())
}

// ===== Jobs =====

pub async fn jobs(ctx: &Context, search: Option<&str>) -> Result<()> {
    let result = match search_query(search) {
        Some(query) => ctx.api.search_jobs(query).await,
        None => ctx.api.available_jobs().await,
    };
    let jobs = result.map_err(|e| ctx.on_error(e))?;

    if jobs.is_empty() {
        println!("No jobs found");
        return Ok(());
    }
    for job in &jobs {
        println!("{}", job.headline());
        if !job.job_type.is_empty() || job.salary.is_some() {
            let salary = job.salary.as_deref().unwrap_or("salary not listed");
            println!("    {} | {}", job.job_type, salary);
        }
        if !job.tags.is_empty() {
            println!("    {}", job.tags.join(", "));
        }
    }
    Ok(())
}

// ===== Chatbot =====

pub async fn chat(
    ctx: &Context,
    message: &str,
    session_id: Option<String>,
    new_session: bool,
) -> Result<()> {
    let session_id = if new_session {
        let created = ctx
            .api
            .new_chat_session()
            .await
            .map_err(|e| ctx.on_error(e))?;
        eprintln!("Chat session {}", created.session_id);
        Some(created.session_id)
    } else {
        session_id
    };

    let reply = ctx
        .api
        .send_chat_message(message, session_id.as_deref())
        .await
        .map_err(|e| ctx.on_error(e))?;
    if let Some(id) = reply.session_id.as_deref() {
        if session_id.as_deref() != Some(id) {
            eprintln!("Chat session {}", id);
        }
    }
    print!("{}", render_reply(&reply));
    Ok(())
}

fn render_reply(reply: &ChatReply) -> String {
    let mut out = format!("{}\n", reply.message);
    if !reply.suggestions.is_empty() {
        out.push_str("\nYou could ask:\n");
        for suggestion in &reply.suggestions {
            out.push_str(&format!("  - {}\n", suggestion));
        }
    }
    out
}

pub async fn chat_summary(ctx: &Context, session_id: &str) -> Result<()> {
    let summary = ctx
        .api
        .chat_session_summary(session_id)
        .await
        .map_err(|e| ctx.on_error(e))?;
    println!("{}", serde_json::to_string_pretty(&summary)?);
    Ok(())
}

// ===== Resume =====

pub async fn upload_resume(ctx: &Context, path: &Path) -> Result<()> {
    if !path.is_file() {
        bail!("{} is not a file", path.display());
    }
    let response = ctx
        .api
        .upload_resume(path)
        .await
        .map_err(|e| ctx.on_error(e))?;
    println!("{}", serde_json::to_string_pretty(&response)?);
    Ok(())
}

// ===== Interview practice =====

pub fn interview(category: Category, question: Option<u32>, answer: Option<String>) -> Result<()> {
    let Some(id) = question else {
        println!("{} questions:", category);
        for q in interview::questions(category) {
            println!("  [{}] {}", q.id, q.question);
            println!("      Tip: {}", q.tips);
        }
        println!("\nPractice one with `careerchamp interview --question <id>`");
        return Ok(());
    };

    let question = match interview::find_question(id) {
        Some(q) => q,
        None => bail!("No interview question with id {}", id),
    };
    println!("{}", question.question);
    println!("Tip: {}", question.tips);

    let answer = match answer {
        Some(answer) => answer,
        None => prompt("Your answer")?,
    };
    let feedback = match interview::score_answer(question, &answer, &mut rand::thread_rng()) {
        Some(feedback) => feedback,
        None => bail!("Answer required"),
    };
    print!("{}", feedback_card(question, &answer, &feedback));
    Ok(())
}

fn feedback_card(question: &Question, answer: &str, feedback: &interview::Feedback) -> String {
    format!(
        "\nQuestion:    {}\nYour answer: {}\nFeedback:    {}\nScore:       {}/10\nSample:      {}\n",
        question.question,
        answer.trim(),
        feedback.feedback,
        feedback.score,
        question.sample_answer
    )
}

// ===== Health =====

pub async fn ping(ctx: &Context) -> Result<()> {
    let pong = ctx.api.ping().await?;
    println!("{} ({})", pong.message, ctx.api.base_url());
    Ok(())
}

// ===== Session =====

pub async fn watch(ctx: &Context) -> Result<()> {
    let mut views = ctx.session.subscribe();
    let current = views.borrow_and_update().clone();
    if !current.is_authenticated {
        bail!("Not logged in");
    }
    println!("{}", describe(&current));

    loop {
        tokio::select! {
            changed = views.changed() => {
                if changed.is_err() {
                    break;
                }
                let view = views.borrow_and_update().clone();
                println!("{}", describe(&view));
                if !view.is_authenticated {
                    break;
                }
            }
            _ = tokio::signal::ctrl_c() => {
                eprintln!("Stopped watching");
                break;
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use careerchamp_core::Claims;

    fn view(claims: Option<Claims>, is_loading: bool) -> SessionView {
        SessionView {
            is_authenticated: claims.is_some(),
            claims,
            is_loading,
        }
    }

    #[test]
    fn test_describe_logged_in() {
        let claims = Claims {
            sub: "42".to_string(),
            exp: Utc::now().timestamp() + 30 * 60 + 30,
            extra: Default::default(),
        };
        assert_eq!(
            describe(&view(Some(claims), false)),
            "Logged in as 42 (expires in 30 min)"
        );
    }

    #[test]
    fn test_describe_anonymous_and_loading() {
        assert_eq!(describe(&view(None, false)), "Not logged in");
        assert_eq!(describe(&view(None, true)), "Restoring session...");
    }

    #[test]
    fn test_render_reply_lists_suggestions() {
        let reply: ChatReply = serde_json::from_str(
            r#"{"response": {"message": "Use STAR", "suggestions": ["Practice", "Prepare examples"]}}"#,
        )
        .unwrap();
        assert_eq!(
            render_reply(&reply),
            "Use STAR\n\nYou could ask:\n  - Practice\n  - Prepare examples\n"
        );

        let plain: ChatReply = serde_json::from_str(r#"{"reply": "Hello"}"#).unwrap();
        assert_eq!(render_reply(&plain), "Hello\n");
    }

    #[test]
    fn test_feedback_card() {
        let question = interview::find_question(4).unwrap();
        let feedback = interview::Feedback {
            score: 8,
            feedback: "Good answer!".to_string(),
        };
        let card = feedback_card(question, "  HTTP verbs on resources \n", &feedback);
        assert!(card.contains("Question:    What is a REST API?"));
        assert!(card.contains("Your answer: HTTP verbs on resources\n"));
        assert!(card.contains("Score:       8/10"));
    }
}
