use std::collections::BTreeMap;

use uuid::Uuid;

use crate::webhook::RepositoryRef;

/// Parameters the job template declares. Adding one here means adding it
/// to the template as well.
pub const JOB_PARAMETERS: [&str; 6] = [
    "REPO_NAMESPACE",
    "REPO_NAME",
    "REPO_DESCRIPTION",
    "REPO_URL",
    "GIT_SHA",
    "UNIQ_ID",
];

/// A job to be created from the template and triggered with `params`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobSpec {
    pub name: String,
    pub params: BTreeMap<&'static str, String>,
}

impl JobSpec {
    /// Build the job for a push to `repo`, correlated by `uniq_id`.
    pub fn for_push(repo: &RepositoryRef, uniq_id: Uuid) -> Self {
        let values = [
            repo.namespace.clone(),
            repo.name.clone(),
            repo.description.clone(),
            repo.url.clone(),
            repo.commit_sha.clone(),
            uniq_id.to_string(),
        ];

        Self {
            name: job_name(&repo.namespace, &repo.name, uniq_id),
            params: JOB_PARAMETERS.into_iter().zip(values).collect(),
        }
    }
}

/// `{namespace}__{repo}__{uuid}`, restricted to characters safe in a path
/// segment and a file name.
pub fn job_name(namespace: &str, repo: &str, uniq_id: Uuid) -> String {
    format!("{}__{}__{}", sanitize(namespace), sanitize(repo), uniq_id)
}

fn sanitize(part: &str) -> String {
    part.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.') {
                c
            } else {
                '-'
            }
        })
        .collect()
}
