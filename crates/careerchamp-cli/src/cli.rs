//! Command-line definitions for the `careerchamp` binary.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use careerchamp_core::interview::Category;

#[derive(Parser)]
#[command(name = "careerchamp")]
#[command(version)]
#[command(about = "Career Champ - jobs, resume upload and career chat from the terminal", long_about = None)]
pub struct Cli {
    /// Backend URL (overrides the config file)
    #[arg(long, global = true, env = "CAREERCHAMP_API_URL")]
    pub api_url: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Log in with email and password
    Login {
        /// Account email (defaults to the last one used)
        #[arg(short, long)]
        email: Option<String>,
    },

    /// Create an account
    Register {
        #[arg(short, long)]
        username: String,

        #[arg(short, long)]
        email: String,
    },

    /// Log out and forget the stored token
    Logout,

    /// Show who is logged in
    Status {
        /// Print the session as JSON
        #[arg(long)]
        json: bool,
    },

    /// List available jobs, or search them
    Jobs {
        /// Free-text search query
        #[arg(short, long)]
        search: Option<String>,
    },

    /// Send a message to the career chatbot
    Chat {
        message: String,

        /// Continue an existing chat session
        #[arg(short, long)]
        session: Option<String>,

        /// Start a fresh chat session first
        #[arg(long, conflicts_with = "session")]
        new: bool,
    },

    /// Show the summary of a chat session
    ChatSummary { session_id: String },

    /// Upload a resume file
    UploadResume { path: PathBuf },

    /// Practice interview questions and get a mock score
    Interview {
        /// Question category: general, technical or behavioral
        #[arg(short, long, default_value_t = Category::General)]
        category: Category,

        /// Practice one question by id instead of listing the category
        #[arg(short, long)]
        question: Option<u32>,

        /// Answer to score (prompted for when omitted)
        #[arg(short, long, requires = "question")]
        answer: Option<String>,
    },

    /// Check that the backend is reachable
    Ping,

    /// Stay in the foreground and report session changes until logout or expiry
    Watch,
}
