//! Job listings returned by the jobs endpoints.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS))]
pub struct Job {
    pub id: i64,
    pub title: String,
    #[serde(default)]
    pub company: String,
    #[serde(default)]
    pub location: String,
    #[serde(default)]
    pub tags: Vec<String>,
    pub salary: Option<String>,
    pub posted: Option<String>,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub requirements: Vec<String>,
    #[serde(rename = "type", default)]
    pub job_type: String,
    pub experience: Option<String>,
}

impl Job {
    /// One-line summary, e.g. "Cloud Engineer @ TechCorp (Bangalore)".
    pub fn headline(&self) -> String {
        let mut line = self.title.clone();
        if !self.company.is_empty() {
            line.push_str(" @ ");
            line.push_str(&self.company);
        }
        if !self.location.is_empty() {
            line.push_str(&format!(" ({})", self.location));
        }
        line
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct JobSearchRequest {
    pub query: String,
}

/// Trimmed search text, or `None` when there is nothing to search for.
pub fn search_query(raw: Option<&str>) -> Option<&str> {
    raw.map(str::trim).filter(|q| !q.is_empty())
}

/// Job list as returned by the jobs endpoints: usually `{"jobs": [...]}`,
/// though some deployments answer with the bare array.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum JobsResponse {
    Bare(Vec<Job>),
    Wrapped {
        #[serde(default)]
        jobs: Vec<Job>,
    },
}

impl JobsResponse {
    pub fn into_jobs(self) -> Vec<Job> {
        match self {
            JobsResponse::Bare(jobs) | JobsResponse::Wrapped { jobs } => jobs,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_jobs_response() {
        let body = r#"{
            "jobs": [{
                "id": 2,
                "title": "Cloud Engineer",
                "company": "TechCorp",
                "location": "Bangalore",
                "tags": ["AWS", "Kubernetes", "DevOps"],
                "salary": "10-15 LPA",
                "posted": "2 weeks ago",
                "description": "Deploy and manage scalable cloud infrastructure on AWS.",
                "requirements": ["AWS", "Kubernetes", "Terraform"],
                "type": "Full-time",
                "experience": "2+ years"
            }]
        }"#;
        let jobs = serde_json::from_str::<JobsResponse>(body).unwrap().into_jobs();
        assert_eq!(jobs.len(), 1);

        let job = &jobs[0];
        assert_eq!(job.job_type, "Full-time");
        assert_eq!(job.tags, vec!["AWS", "Kubernetes", "DevOps"]);
        assert_eq!(job.headline(), "Cloud Engineer @ TechCorp (Bangalore)");
    }

    #[test]
    fn test_sparse_job_defaults() {
        let jobs = serde_json::from_str::<JobsResponse>(r#"{"jobs": [{"id": 7, "title": "Intern"}]}"#)
            .unwrap()
            .into_jobs();
        let job = &jobs[0];
        assert!(job.tags.is_empty());
        assert!(job.requirements.is_empty());
        assert!(job.salary.is_none());
        assert_eq!(job.headline(), "Intern");
    }

    #[test]
    fn test_missing_jobs_key_is_empty() {
        let parsed: JobsResponse = serde_json::from_str("{}").unwrap();
        assert!(parsed.into_jobs().is_empty());
    }

    #[test]
    fn test_bare_array_response() {
        let body = r#"[{"id": 1, "title": "Data Analyst"}, {"id": 2, "title": "Cloud Engineer"}]"#;
        let jobs = serde_json::from_str::<JobsResponse>(body).unwrap().into_jobs();
        let titles: Vec<_> = jobs.iter().map(|j| j.title.as_str()).collect();
        assert_eq!(titles, ["Data Analyst", "Cloud Engineer"]);

        assert!(serde_json::from_str::<JobsResponse>("[]").unwrap().into_jobs().is_empty());
    }

    #[test]
    fn test_blank_search_falls_back_to_listing() {
        assert_eq!(search_query(None), None);
        assert_eq!(search_query(Some("")), None);
        assert_eq!(search_query(Some("  \t")), None);
        assert_eq!(search_query(Some("  rust developer ")), Some("rust developer"));
    }
}
