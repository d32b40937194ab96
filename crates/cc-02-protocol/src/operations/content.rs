use super::{check, validate_account_name, validate_json, BaseOperation};
use crate::authority::RequiredAuthorities;
use crate::config::{MAX_PERMLINK_LENGTH, MAX_TITLE_LENGTH, PERCENT_100};
use crate::errors::ProtocolResult;
use serde::{Deserialize, Serialize};
use shared_types::AccountName;

/// Create or edit a post (`parent_author` empty) or a reply.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommentOperation {
    pub parent_author: AccountName,
    pub parent_permlink: String,
    pub author: AccountName,
    pub permlink: String,
    pub title: String,
    pub body: String,
    pub json_metadata: String,
}

impl CommentOperation {
    pub fn is_root(&self) -> bool {
        self.parent_author.is_empty()
    }
}

fn validate_permlink(field: &'static str, permlink: &str) -> ProtocolResult<()> {
    check(!permlink.is_empty(), field, "permlink cannot be empty")?;
    check(permlink.len() < MAX_PERMLINK_LENGTH, field, "permlink is too long")?;
    check(
        permlink
            .bytes()
            .all(|b| b.is_ascii_lowercase() || b.is_ascii_digit() || b == b'-'),
        field,
        "permlink contains invalid characters",
    )
}

impl BaseOperation for CommentOperation {
    fn validate(&self) -> ProtocolResult<()> {
        validate_account_name("author", &self.author)?;
        if !self.is_root() {
            validate_account_name("parent_author", &self.parent_author)?;
        }
        validate_permlink("permlink", &self.permlink)?;
        validate_permlink("parent_permlink", &self.parent_permlink)?;
        check(self.title.len() < MAX_TITLE_LENGTH, "title", "title is too long")?;
        check(!self.body.is_empty(), "body", "body cannot be empty")?;
        validate_json("json_metadata", &self.json_metadata)
    }

    fn get_required_authorities(&self, required: &mut RequiredAuthorities) {
        required.posting.insert(self.author.clone());
    }
}

/// Up- or down-vote a comment. Weight is in hundredths of a percent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoteOperation {
    pub voter: AccountName,
    pub author: AccountName,
    pub permlink: String,
    pub weight: i16,
}

impl BaseOperation for VoteOperation {
    fn validate(&self) -> ProtocolResult<()> {
        validate_account_name("voter", &self.voter)?;
        validate_account_name("author", &self.author)?;
        validate_permlink("permlink", &self.permlink)?;
        check(
            i32::from(self.weight).unsigned_abs() <= PERCENT_100,
            "weight",
            "weight is out of range",
        )
    }

    fn get_required_authorities(&self, required: &mut RequiredAuthorities) {
        required.posting.insert(self.voter.clone());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn post() -> CommentOperation {
        CommentOperation {
            parent_author: AccountName::default(),
            parent_permlink: "cedar".into(),
            author: "alice".into(),
            permlink: "first-post".into(),
            title: "First".into(),
            body: "hello".into(),
            json_metadata: "{\"tags\":[\"cedar\"]}".into(),
        }
    }

    #[test]
    fn test_comment_validation() {
        assert!(post().validate().is_ok());
        assert!(post().is_root());

        let mut bad = post();
        bad.permlink = "Upper".into();
        assert!(bad.validate().is_err());

        let mut bad = post();
        bad.body.clear();
        assert!(bad.validate().is_err());

        let mut bad = post();
        bad.json_metadata = "{".into();
        assert!(bad.validate().is_err());
    }

    #[test]
    fn test_vote_weight_bounds() {
        let mut vote = VoteOperation {
            voter: "bob".into(),
            author: "alice".into(),
            permlink: "first-post".into(),
            weight: 10_000,
        };
        assert!(vote.validate().is_ok());
        vote.weight = -10_000;
        assert!(vote.validate().is_ok());
        vote.weight = 10_001;
        assert!(vote.validate().is_err());
    }
}
