//! Typed API endpoints.
//!
//! Thin wrappers over [`RequestClient`] for the calls the editor pages
//! make. Every one of them fails with the same [`RequestError`] shape.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::client::RequestClient;
use crate::context::MentionUser;
use crate::error::RequestError;
use crate::forms::{CommentForm, FormState};
use crate::transport::Transport;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct UserInfo {
    pub id: String,
    pub username: String,
    pub display_name: String,
    pub avatar: String,
    pub rank: i64,
    pub role_id: i64,
    pub status: String,
    /// Present only right after login.
    #[serde(skip_serializing_if = "String::is_empty")]
    pub access_token: String,
}

impl UserInfo {
    pub fn as_mention(&self) -> MentionUser {
        MentionUser {
            username: self.username.clone(),
            display_name: self.display_name.clone(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TagItem {
    pub slug_name: String,
    pub display_name: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub original_text: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuestionAdd {
    pub title: String,
    pub content: String,
    pub tags: Vec<TagItem>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuestionModify {
    pub id: String,
    pub title: String,
    pub content: String,
    pub tags: Vec<TagItem>,
    #[serde(default)]
    pub edit_summary: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct QuestionInfo {
    pub id: String,
    pub title: String,
    pub url_title: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnswerAdd {
    pub question_id: String,
    pub content: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnswerInfo {
    pub id: String,
    pub question_id: String,
    pub content: String,
    pub html: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VoteDirection {
    Up,
    Down,
}

impl VoteDirection {
    fn path(self) -> &'static str {
        match self {
            Self::Up => "/vote/up",
            Self::Down => "/vote/down",
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoteRequest {
    pub object_id: String,
    /// Withdraw a vote already cast in this direction.
    pub is_cancel: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct VoteResult {
    pub up_votes: i64,
    pub down_votes: i64,
    pub votes: i64,
    pub vote_status: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommentAdd {
    pub object_id: String,
    pub original_text: String,
    pub mention_username_list: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reply_comment_id: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CommentInfo {
    pub comment_id: String,
    pub object_id: String,
    pub original_text: String,
    pub parsed_text: String,
    pub username: String,
    pub user_display_name: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Page<T> {
    #[serde(default)]
    pub count: u64,
    #[serde(default)]
    pub list: Vec<T>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationKind {
    Inbox,
    Achievement,
}

impl NotificationKind {
    fn as_str(self) -> &'static str {
        match self {
            Self::Inbox => "inbox",
            Self::Achievement => "achievement",
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NotificationItem {
    pub id: String,
    pub notification_action: String,
    pub is_read: bool,
    pub update_time: i64,
    pub object_info: Value,
}

/// `@name` tokens in `text`, in order, without duplicates.
pub fn mentioned_usernames(text: &str) -> Vec<String> {
    let mut names: Vec<String> = Vec::new();
    for word in text.split_whitespace() {
        let Some(name) = word.strip_prefix('@') else {
            continue;
        };
        let name: String = name
            .chars()
            .take_while(|c| c.is_alphanumeric() || matches!(c, '_' | '-' | '.'))
            .collect();
        let name = name.trim_end_matches('.').to_string();
        if !name.is_empty() && !names.contains(&name) {
            names.push(name);
        }
    }
    names
}

fn query(pairs: &[(&str, &str)]) -> String {
    url::form_urlencoded::Serializer::new(String::new())
        .extend_pairs(pairs)
        .finish()
}

impl<T: Transport> RequestClient<T> {
    pub async fn add_question(&self, question: &QuestionAdd) -> Result<QuestionInfo, RequestError> {
        self.post("/question/add", question).await
    }

    pub async fn modify_question(
        &self,
        question: &QuestionModify,
    ) -> Result<QuestionInfo, RequestError> {
        self.put("/question/modify", question).await
    }

    pub async fn add_answer(&self, answer: &AnswerAdd) -> Result<AnswerInfo, RequestError> {
        self.post("/answer/add", answer).await
    }

    pub async fn vote(
        &self,
        direction: VoteDirection,
        request: &VoteRequest,
    ) -> Result<VoteResult, RequestError> {
        self.post(direction.path(), request).await
    }

    /// Submit the comment in `form`.
    ///
    /// Local validation runs first; an invalid form is marked and no
    /// request is sent (`Ok(None)`). Server field errors are bound into the
    /// form before being returned.
    pub async fn add_comment(
        &self,
        form: &mut CommentForm,
        object_id: &str,
        reply_comment_id: Option<&str>,
    ) -> Result<Option<CommentInfo>, RequestError> {
        if !form.validate() {
            return Ok(None);
        }
        let body = CommentAdd {
            object_id: object_id.to_string(),
            original_text: form.content().to_string(),
            mention_username_list: mentioned_usernames(form.content()),
            reply_comment_id: reply_comment_id.map(str::to_string),
        };
        match self.post::<_, CommentInfo>("/comment", &body).await {
            Ok(comment) => {
                form.reset();
                Ok(Some(comment))
            }
            Err(err) => {
                bind_errors(&mut form.state, &err);
                Err(err)
            }
        }
    }

    /// One page of comments on a post. Commenters join the mention cache.
    pub async fn comment_page(
        &self,
        object_id: &str,
        page: u32,
    ) -> Result<Page<CommentInfo>, RequestError> {
        let page = page.to_string();
        let path = format!(
            "/comment/page?{}",
            query(&[("object_id", object_id), ("page", &page)])
        );
        let comments: Page<CommentInfo> = self.get(&path).await?;
        self.context()
            .mentions
            .extend(comments.list.iter().map(|c| MentionUser {
                username: c.username.clone(),
                display_name: c.user_display_name.clone(),
            }));
        Ok(comments)
    }

    pub async fn notification_page(
        &self,
        kind: NotificationKind,
        page: u32,
        page_size: u32,
    ) -> Result<Page<NotificationItem>, RequestError> {
        let page = page.to_string();
        let page_size = page_size.to_string();
        let path = format!(
            "/notification/page?{}",
            query(&[
                ("type", kind.as_str()),
                ("page", &page),
                ("page_size", &page_size),
            ])
        );
        self.get(&path).await
    }

    /// Tags matching what the user has typed so far.
    pub async fn query_tags(&self, typed: &str) -> Result<Vec<TagItem>, RequestError> {
        let path = format!("/question/tags?{}", query(&[("tag", typed)]));
        self.get(&path).await
    }

    /// Fetch the signed-in user and remember it for the session.
    pub async fn user_info(&self) -> Result<UserInfo, RequestError> {
        let user: UserInfo = self.get("/user/info").await?;
        let ctx = self.context();
        if let Err(err) = ctx.state.set_user(&user) {
            tracing::warn!(error = %err, "failed to persist user");
        }
        ctx.user.set(user.clone());
        ctx.mentions.extend([user.as_mention()]);
        Ok(user)
    }
}

/// Copy server field errors from `err` into `state`, if it carries any.
pub fn bind_errors(state: &mut FormState, err: &RequestError) {
    if let Some(errors) = err.field_errors() {
        state.bind_field_errors(errors);
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::config::ClientConfig;
    use crate::context::AppContext;
    use crate::transport::testing::MockTransport;
    use http::Method;
    use serde_json::json;

    fn client(transport: MockTransport) -> RequestClient<MockTransport> {
        let config = ClientConfig {
            base_url: "https://answers.example.com".into(),
            ..ClientConfig::default()
        };
        RequestClient::new(transport, Arc::new(AppContext::new(config)))
    }

    fn ok(data: Value) -> Value {
        json!({ "code": 200, "msg": "success", "data": data })
    }

    #[test]
    fn test_mentioned_usernames() {
        assert_eq!(
            mentioned_usernames("thanks @ferris, and @alice. cc @ferris @"),
            vec!["ferris", "alice"]
        );
    }

    #[tokio::test]
    async fn test_question_add_and_modify() {
        let c = client(
            MockTransport::new()
                .respond(200, ok(json!({ "id": "q1", "title": "t", "url_title": "t" })))
                .respond(200, ok(json!({ "id": "q1", "title": "t2", "url_title": "t2" }))),
        );
        let tags = vec![TagItem {
            slug_name: "rust".into(),
            display_name: "Rust".into(),
            ..TagItem::default()
        }];
        let created = c
            .add_question(&QuestionAdd {
                title: "t".into(),
                content: "body".into(),
                tags: tags.clone(),
            })
            .await
            .unwrap();
        assert_eq!(created.id, "q1");

        let modified = c
            .modify_question(&QuestionModify {
                id: "q1".into(),
                title: "t2".into(),
                content: "body".into(),
                tags,
                edit_summary: "typo".into(),
            })
            .await
            .unwrap();
        assert_eq!(modified.title, "t2");

        let requests = c.transport().requests();
        assert_eq!(requests[0].method, Method::POST);
        assert_eq!(
            requests[0].url,
            "https://answers.example.com/api/v1/question/add"
        );
        assert_eq!(requests[1].method, Method::PUT);
        assert_eq!(
            requests[1].url,
            "https://answers.example.com/api/v1/question/modify"
        );
        assert_eq!(requests[0].body.as_ref().unwrap()["tags"][0]["slug_name"], "rust");
    }

    #[tokio::test]
    async fn test_add_answer() {
        let c = client(MockTransport::new().respond(
            200,
            ok(json!({ "id": "a1", "question_id": "q1", "content": "use Rc" })),
        ));
        let answer = c
            .add_answer(&AnswerAdd {
                question_id: "q1".into(),
                content: "use Rc".into(),
            })
            .await
            .unwrap();
        assert_eq!(answer.id, "a1");

        let request = &c.transport().requests()[0];
        assert_eq!(request.method, Method::POST);
        assert_eq!(request.url, "https://answers.example.com/api/v1/answer/add");
        assert_eq!(request.body.as_ref().unwrap()["question_id"], "q1");
    }

    #[tokio::test]
    async fn test_vote_without_content() {
        let c = client(MockTransport::new().respond_raw(204, ""));
        let request = VoteRequest {
            object_id: "a1".into(),
            is_cancel: true,
        };
        let result = c.vote(VoteDirection::Up, &request).await.unwrap();
        assert_eq!(result, VoteResult::default());
        assert!(c.context().toast.current(web_time::Instant::now()).is_none());
    }

    #[tokio::test]
    async fn test_vote_paths() {
        let c = client(
            MockTransport::new()
                .respond(200, ok(json!({ "votes": 1, "up_votes": 1, "vote_status": "vote_up" })))
                .respond(200, ok(json!({ "votes": 0 }))),
        );
        let request = VoteRequest {
            object_id: "a1".into(),
            is_cancel: false,
        };
        let up = c.vote(VoteDirection::Up, &request).await.unwrap();
        assert_eq!(up.votes, 1);
        assert_eq!(up.vote_status, "vote_up");
        c.vote(VoteDirection::Down, &request).await.unwrap();

        let urls: Vec<_> = c.transport().requests().into_iter().map(|r| r.url).collect();
        assert!(urls[0].ends_with("/vote/up"));
        assert!(urls[1].ends_with("/vote/down"));
    }

    #[tokio::test]
    async fn test_empty_comment_sends_nothing() {
        let c = client(MockTransport::new());
        let mut form = CommentForm::new();
        let result = c.add_comment(&mut form, "q1", None).await.unwrap();
        assert_eq!(result, None);
        assert!(form.state.get("content").unwrap().is_invalid);
        assert!(c.transport().requests().is_empty());
    }

    #[tokio::test]
    async fn test_comment_submit() {
        let c = client(MockTransport::new().respond(
            200,
            ok(json!({ "comment_id": "c1", "object_id": "q1", "original_text": "hi @ferris" })),
        ));
        let mut form = CommentForm::new();
        form.set_content("hi @ferris");
        let comment = c.add_comment(&mut form, "q1", Some("c0")).await.unwrap().unwrap();
        assert_eq!(comment.comment_id, "c1");
        assert_eq!(form.content(), "");

        let body = c.transport().requests()[0].body.clone().unwrap();
        assert_eq!(body["mention_username_list"], json!(["ferris"]));
        assert_eq!(body["reply_comment_id"], "c0");
    }

    #[tokio::test]
    async fn test_comment_field_error_binds() {
        let c = client(MockTransport::new().respond(
            400,
            json!({ "msg": "", "data": { "key": "content", "value": "contains blocked words" } }),
        ));
        let mut form = CommentForm::new();
        form.set_content("spam");
        let err = c.add_comment(&mut form, "q1", None).await.unwrap_err();
        assert!(!err.is_surfaced());
        let field = form.state.get("content").unwrap();
        assert!(field.is_invalid);
        assert_eq!(field.error_msg, "contains blocked words");
        assert_eq!(form.content(), "spam");
    }

    #[tokio::test]
    async fn test_comment_page_fills_mentions() {
        let c = client(MockTransport::new().respond(
            200,
            ok(json!({ "count": 2, "list": [
                { "comment_id": "c1", "username": "ferris", "user_display_name": "Ferris" },
                { "comment_id": "c2", "username": "alice", "user_display_name": "Alice" }
            ]})),
        ));
        let page = c.comment_page("q1", 1).await.unwrap();
        assert_eq!(page.count, 2);
        assert_eq!(c.context().mentions.len(), 2);
        assert!(
            c.transport().requests()[0]
                .url
                .ends_with("/comment/page?object_id=q1&page=1")
        );
    }

    #[tokio::test]
    async fn test_tags_query_is_encoded() {
        let c = client(MockTransport::new().respond(
            200,
            ok(json!([{ "slug_name": "c++", "display_name": "C++" }])),
        ));
        let tags = c.query_tags("c++").await.unwrap();
        assert_eq!(tags[0].display_name, "C++");
        assert!(
            c.transport().requests()[0]
                .url
                .ends_with("/question/tags?tag=c%2B%2B")
        );
    }

    #[tokio::test]
    async fn test_notification_page() {
        let c = client(MockTransport::new().respond(
            200,
            ok(json!({ "count": 1, "list": [{ "id": "n1", "is_read": false }] })),
        ));
        let page = c
            .notification_page(NotificationKind::Inbox, 1, 10)
            .await
            .unwrap();
        assert_eq!(page.list[0].id, "n1");
        assert!(
            c.transport().requests()[0]
                .url
                .ends_with("/notification/page?type=inbox&page=1&page_size=10")
        );
    }

    #[tokio::test]
    async fn test_user_info_is_remembered() {
        let c = client(MockTransport::new().respond(
            200,
            ok(json!({ "id": "u1", "username": "ferris", "display_name": "Ferris" })),
        ));
        let user = c.user_info().await.unwrap();
        let ctx = c.context();
        assert_eq!(ctx.user.get(), Some(user.clone()));
        assert_eq!(ctx.state.user(), Some(user));
        assert_eq!(ctx.mentions.matching("fer").len(), 1);
    }
}
