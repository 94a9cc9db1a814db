use sha2::{Digest, Sha256};
use uuid::Uuid;

/// Short, readable master project id such as `deep-work-19dc`.
pub fn generate_project_id<F>(name: &str, mut exists: F) -> String
where
    F: FnMut(&str) -> bool,
{
    let slug = name_slug(name);

    for _ in 0..64 {
        let seed = Uuid::now_v7().to_string();
        let mut hasher = Sha256::new();
        hasher.update(seed.as_bytes());
        let digest = format!("{:x}", hasher.finalize());
        let short = &digest[..4];
        let candidate = format!("{}-{}", slug, short);
        if !exists(&candidate) {
            return candidate;
        }
    }

    format!("{}-{}", slug, &Uuid::now_v7().simple().to_string()[..8])
}

pub fn new_occurrence_id() -> String {
    Uuid::now_v7().to_string()
}

pub fn new_template_id() -> String {
    format!("T-{}", Uuid::now_v7())
}

pub fn name_slug(raw: &str) -> String {
    let mut slug = String::new();
    let mut pending_dash = false;
    for ch in raw.chars() {
        if ch.is_ascii_alphanumeric() {
            if pending_dash && !slug.is_empty() {
                slug.push('-');
            }
            pending_dash = false;
            slug.push(ch.to_ascii_lowercase());
        } else {
            pending_dash = true;
        }
    }
    if slug.is_empty() {
        "project".to_string()
    } else {
        slug
    }
}
