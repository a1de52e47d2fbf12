use anyhow::{anyhow, bail, Result};

#[derive(Debug, Clone, PartialEq, Eq)]
/// Public struct `RepoRef` identifying a repository by owner and name.
pub struct RepoRef {
    pub owner: String,
    pub name: String,
}

impl RepoRef {
    pub fn new(owner: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            owner: owner.into(),
            name: name.into(),
        }
    }

    pub fn parse(raw: &str) -> Result<Self> {
        let trimmed = raw.trim();
        let (owner, name) = trimmed
            .split_once('/')
            .ok_or_else(|| anyhow!("invalid repository '{raw}', expected owner/repo"))?;
        let owner = owner.trim();
        let name = name.trim();
        if owner.is_empty() || name.is_empty() || name.contains('/') {
            bail!("invalid repository '{raw}', expected owner/repo");
        }
        Ok(Self::new(owner, name))
    }

    pub fn as_slug(&self) -> String {
        format!("{}/{}", self.owner, self.name)
    }
}

#[cfg(test)]
mod tests {
    use super::RepoRef;

    #[test]
    fn unit_parse_splits_owner_and_name() {
        let repo = RepoRef::parse(" acme/widgets ").expect("repo");
        assert_eq!(repo, RepoRef::new("acme", "widgets"));
        assert_eq!(repo.as_slug(), "acme/widgets");
    }

    #[test]
    fn regression_parse_rejects_nested_and_empty_segments() {
        assert!(RepoRef::parse("acme").is_err());
        assert!(RepoRef::parse("acme/").is_err());
        assert!(RepoRef::parse("acme/widgets/extra").is_err());
    }
}
