//! GitHub profile lookup and character derivation
//!
//! Class and stats are a fixed function of the public repository and
//! follower counts, so the same profile always yields the same character.

use std::future::Future;

use anyhow::{Context, Result};
use gitbattle_protocol::{Character, ClassTag, Stats};
use reqwest::StatusCode;
use serde::Deserialize;

use crate::error::GameError;

const GITHUB_API: &str = "https://api.github.com";
const USER_AGENT: &str = concat!("gitbattle/", env!("CARGO_PKG_VERSION"));

/// The profile fields characters are built from
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RawProfile {
    pub login: String,
    pub avatar_url: String,
    pub public_repos: u32,
    pub followers: u32,
}

pub trait ProfileLookup: Send + Sync {
    /// `Ok(None)` when the user does not exist
    fn lookup(&self, username: &str) -> impl Future<Output = Result<Option<RawProfile>>> + Send;
}

/// The public GitHub REST API
#[derive(Debug, Clone)]
pub struct GithubProfiles {
    client: reqwest::Client,
    base_url: String,
    token: Option<String>,
}

impl GithubProfiles {
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: GITHUB_API.to_string(),
            token: None,
        }
    }

    /// Point at a mirror or a test server
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    /// Authenticated requests get a higher rate limit
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }
}

impl Default for GithubProfiles {
    fn default() -> Self {
        Self::new()
    }
}

impl ProfileLookup for GithubProfiles {
    async fn lookup(&self, username: &str) -> Result<Option<RawProfile>> {
        let url = format!("{}/users/{}", self.base_url, username);

        let mut request = self
            .client
            .get(&url)
            .header(reqwest::header::USER_AGENT, USER_AGENT)
            .header(reqwest::header::ACCEPT, "application/vnd.github+json");
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }

        let response = request
            .send()
            .await
            .with_context(|| format!("Failed to fetch profile {}", username))?;

        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }

        let profile = response
            .error_for_status()
            .context("Profile request rejected")?
            .json::<RawProfile>()
            .await
            .context("Failed to parse profile response")?;

        Ok(Some(profile))
    }
}

/// Pick the class from repository and follower counts
pub fn derive_class(public_repos: u32, followers: u32) -> ClassTag {
    if public_repos > 50 {
        ClassTag::FullStackSorcerer
    } else if followers > 50 {
        ClassTag::DevOpsPaladin
    } else if public_repos > 20 {
        ClassTag::BackendMage
    } else if public_repos > 10 {
        ClassTag::FrontendWarrior
    } else {
        ClassTag::Novice
    }
}

/// Build the combat character for a profile
pub fn derive_character(profile: &RawProfile) -> Character {
    let repos = profile.public_repos;
    let followers = profile.followers;
    let class_tag = derive_class(repos, followers);

    let mut stats = Stats {
        hp: 100 + repos * 3 + followers,
        attack: 10 + repos / 2,
        defense: 5 + followers / 2,
        speed: 10 + repos / 5,
    };

    match class_tag {
        ClassTag::FrontendWarrior => stats.speed += 15,
        ClassTag::DevOpsPaladin => stats.defense += 10,
        ClassTag::BackendMage => stats.attack += 15,
        ClassTag::FullStackSorcerer => {
            stats.speed += 5;
            stats.attack += 5;
        }
        ClassTag::Novice => {}
    }

    Character::new(profile.login.clone(), profile.avatar_url.clone(), class_tag, stats)
}

/// Stand-in character for a player whose profile could not be loaded
pub fn fallback_character(username: &str) -> Character {
    derive_character(&RawProfile {
        login: username.to_string(),
        avatar_url: format!("https://github.com/{}.png", username),
        public_repos: 0,
        followers: 0,
    })
}

/// Look a player up and turn them into a character
pub async fn summon<P: ProfileLookup>(profiles: &P, username: &str) -> Result<Character, GameError> {
    match profiles.lookup(username).await {
        Ok(Some(profile)) => Ok(derive_character(&profile)),
        Ok(None) => Err(GameError::ProfileNotFound(username.to_string())),
        Err(e) => {
            tracing::warn!(username, error = %e, "Profile lookup failed");
            Err(GameError::ProfileNotFound(username.to_string()))
        }
    }
}
