//! Keyword-based skill extraction from resume text.

const SKILL_KEYWORDS: &[&str] = &[
    "python", "java", "javascript", "typescript", "rust", "go", "c++", "c#",
    "react", "angular", "vue", "node.js", "html", "css", "bootstrap", "tailwind",
    "sql", "mysql", "postgresql", "mongodb", "redis", "elasticsearch",
    "docker", "kubernetes", "terraform", "aws", "azure", "gcp",
    "flask", "django", "spring", "laravel", "rails",
    "git", "github", "gitlab", "jenkins", "ci/cd", "agile", "scrum",
    "rest", "api", "graphql", "grpc", "kafka", "rabbitmq",
    "machine learning", "data science", "pandas", "numpy", "tensorflow",
    "pytorch", "power bi", "tableau", "excel",
];

const MAX_SKILLS: usize = 10;

/// Scans the resume text for known skill keywords, preserving the keyword
/// list's order (roughly most-common-first), capped at ten entries.
pub fn extract_skills(text: &str) -> Vec<String> {
    let lower = text.to_lowercase();
    SKILL_KEYWORDS
        .iter()
        .filter(|skill| lower.contains(*skill))
        .take(MAX_SKILLS)
        .map(|skill| title_case(skill))
        .collect()
}

fn title_case(s: &str) -> String {
    s.split(' ')
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}
