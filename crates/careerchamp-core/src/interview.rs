//! Interview practice: a fixed question bank and mock answer scoring.
//!
//! Scoring is local and does not read the answer beyond checking that one was
//! given: every non-blank answer gets 7 to 9 out of 10 plus the question's tip.

use std::fmt;
use std::str::FromStr;

use rand::Rng;
use serde::Serialize;

/// Lowest and highest mock score.
const SCORE_RANGE: std::ops::RangeInclusive<u8> = 7..=9;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    #[default]
    General,
    Technical,
    Behavioral,
}

impl Category {
    pub const ALL: [Category; 3] = [Category::General, Category::Technical, Category::Behavioral];

    pub fn as_str(self) -> &'static str {
        match self {
            Category::General => "general",
            Category::Technical => "technical",
            Category::Behavioral => "behavioral",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Category::ALL
            .into_iter()
            .find(|c| c.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| format!("unknown category '{}' (general, technical, behavioral)", s))
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Question {
    pub id: u32,
    pub category: Category,
    pub question: &'static str,
    pub tips: &'static str,
    pub sample_answer: &'static str,
}

const QUESTIONS: &[Question] = &[
    Question {
        id: 1,
        category: Category::General,
        question: "Tell me about yourself.",
        tips: "Structure your answer: education, relevant experience, key skills, and career goals.",
        sample_answer: "I am a computer science student with a passion for software development. I have experience in React and Python, and I'm particularly interested in full-stack development.",
    },
    Question {
        id: 2,
        category: Category::General,
        question: "Why do you want to work for our company?",
        tips: "Research the company, mention specific values or products that align with your interests.",
        sample_answer: "I'm excited about your company's innovative approach to technology and your commitment to user experience.",
    },
    Question {
        id: 3,
        category: Category::General,
        question: "What are your strengths and weaknesses?",
        tips: "Be honest about weaknesses but show how you're working to improve them.",
        sample_answer: "My strength is problem-solving. My weakness is public speaking, but I'm taking courses to improve.",
    },
    Question {
        id: 4,
        category: Category::Technical,
        question: "What is a REST API?",
        tips: "Explain the concept, mention HTTP methods, and give a real-world example.",
        sample_answer: "REST API is a way for applications to communicate over HTTP. It uses methods like GET, POST, PUT, DELETE to perform operations on resources.",
    },
    Question {
        id: 5,
        category: Category::Technical,
        question: "Explain the difference between SQL and NoSQL databases.",
        tips: "Compare structure, scalability, and use cases for each type.",
        sample_answer: "SQL databases are relational with structured data, while NoSQL databases are non-relational and more flexible for unstructured data.",
    },
    Question {
        id: 6,
        category: Category::Technical,
        question: "What is version control and why is it important?",
        tips: "Explain Git concepts, branching, and collaboration benefits.",
        sample_answer: "Version control tracks changes in code over time, allowing teams to collaborate, revert changes, and maintain code history.",
    },
    Question {
        id: 7,
        category: Category::Behavioral,
        question: "Tell me about a time you faced a difficult challenge.",
        tips: "Use the STAR method: Situation, Task, Action, Result.",
        sample_answer: "In my last project, I had to learn a new framework in a week. I broke it down into daily goals and successfully delivered the project.",
    },
    Question {
        id: 8,
        category: Category::Behavioral,
        question: "How do you handle working under pressure?",
        tips: "Give a specific example and explain your stress management techniques.",
        sample_answer: "I prioritize tasks, break them into smaller chunks, and communicate with my team about deadlines and challenges.",
    },
];

pub fn questions(category: Category) -> impl Iterator<Item = &'static Question> {
    QUESTIONS.iter().filter(move |q| q.category == category)
}

pub fn find_question(id: u32) -> Option<&'static Question> {
    QUESTIONS.iter().find(|q| q.id == id)
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Feedback {
    /// Out of 10
    pub score: u8,
    pub feedback: String,
}

/// Score a practice answer. Returns `None` for a blank answer.
pub fn score_answer<R: Rng>(
    question: &Question,
    answer: &str,
    rng: &mut R,
) -> Option<Feedback> {
    if answer.trim().is_empty() {
        return None;
    }
    Some(Feedback {
        score: rng.gen_range(SCORE_RANGE),
        feedback: format!("Good answer! You covered the main points. {}", question.tips),
    })
}
