//! In-process record store implementing every repository port.
//!
//! Used when no database is configured and by the behaviour tests. All state
//! sits behind one mutex, so each port call is a single critical section and
//! uniqueness checks cannot race. Deletes cascade the way the PostgreSQL
//! foreign keys do.

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use mockable::{Clock, DefaultClock};
use tracing::debug;

use crate::domain::ports::{
    FeedPersistenceError, FeedRepository, FollowPersistenceError, FollowRepository,
    InvitationLookup, InvitationPersistenceError, InvitationRepository, PostPersistenceError,
    PostRepository, StoreProbe, StoreProbeError, UserPersistenceError, UserRepository,
};
use crate::domain::{
    ActivationState, Comment, CommentId, Email, FeedEntry, FeedQuery, FollowEdge,
    InvitationDigest, NewComment, NewInvitation, NewPost, NewUser, Post, PostChanges, PostId,
    SortDirection, User, UserId, UserRecord,
};

#[derive(Debug, Clone, Copy)]
struct Invitation {
    user_id: UserId,
    expires_at: DateTime<Utc>,
}

#[derive(Default)]
struct State {
    next_user_id: i64,
    next_post_id: i64,
    next_comment_id: i64,
    users: BTreeMap<UserId, User>,
    invitations: HashMap<InvitationDigest, Invitation>,
    follows: BTreeSet<(UserId, UserId)>,
    posts: BTreeMap<PostId, Post>,
    comments: BTreeMap<CommentId, Comment>,
    likes: BTreeSet<(PostId, UserId)>,
}

impl State {
    fn allocate_user_id(&mut self) -> UserId {
        self.next_user_id += 1;
        UserId::new(self.next_user_id)
    }

    fn allocate_post_id(&mut self) -> PostId {
        self.next_post_id += 1;
        PostId::new(self.next_post_id)
    }

    fn allocate_comment_id(&mut self) -> CommentId {
        self.next_comment_id += 1;
        CommentId::new(self.next_comment_id)
    }

    fn remove_post(&mut self, id: PostId) -> bool {
        self.comments.retain(|_, comment| comment.post_id != id);
        self.likes.retain(|(post, _)| *post != id);
        self.posts.remove(&id).is_some()
    }

    fn remove_user(&mut self, id: UserId) -> bool {
        let Some(_) = self.users.remove(&id) else {
            return false;
        };
        self.invitations.retain(|_, entry| entry.user_id != id);
        self.follows
            .retain(|(follower, followed)| *follower != id && *followed != id);
        let authored: Vec<PostId> = self
            .posts
            .values()
            .filter(|post| post.author_id == id)
            .map(|post| post.id)
            .collect();
        for post in authored {
            self.remove_post(post);
        }
        self.comments.retain(|_, comment| comment.author_id != id);
        self.likes.retain(|(_, user)| *user != id);
        true
    }

    fn purge_expired_invitations(&mut self, now: DateTime<Utc>) -> usize {
        let before = self.invitations.len();
        self.invitations.retain(|_, entry| entry.expires_at > now);
        before - self.invitations.len()
    }

    fn feed_entry(&self, post: &Post) -> Option<FeedEntry> {
        let author = self.users.get(&post.author_id)?;
        let comment_count = self
            .comments
            .values()
            .filter(|comment| comment.post_id == post.id)
            .count();
        let like_count = self
            .likes
            .iter()
            .filter(|(liked, _)| *liked == post.id)
            .count();
        Some(FeedEntry {
            post: post.clone(),
            author_username: author.username().clone(),
            comment_count: u64::try_from(comment_count).unwrap_or(u64::MAX),
            like_count: u64::try_from(like_count).unwrap_or(u64::MAX),
        })
    }
}

/// Mutex-guarded in-memory implementation of the repository ports.
#[derive(Clone)]
pub struct InMemoryStore {
    state: Arc<Mutex<State>>,
    clock: Arc<dyn Clock>,
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new(Arc::new(DefaultClock))
    }
}

impl InMemoryStore {
    /// Empty store stamping creation times from `clock`.
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            state: Arc::new(Mutex::new(State::default())),
            clock,
        }
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[async_trait]
impl UserRepository for InMemoryStore {
    async fn create_with_invitation(
        &self,
        user: &NewUser,
        invitation: &NewInvitation,
    ) -> Result<User, UserPersistenceError> {
        let mut state = self.lock();
        if state.users.values().any(|u| u.username() == &user.username) {
            return Err(UserPersistenceError::duplicate_username());
        }
        if state.users.values().any(|u| u.email() == &user.email) {
            return Err(UserPersistenceError::duplicate_email());
        }
        let id = state.allocate_user_id();
        let created = User::from(UserRecord {
            id,
            username: user.username.clone(),
            email: user.email.clone(),
            password_hash: user.password_hash.clone(),
            activation: ActivationState::Pending,
            created_at: self.clock.utc(),
        });
        state.users.insert(id, created.clone());
        state.invitations.insert(
            invitation.digest.clone(),
            Invitation {
                user_id: id,
                expires_at: invitation.expires_at,
            },
        );
        Ok(created)
    }

    async fn find_by_id(&self, id: UserId) -> Result<Option<User>, UserPersistenceError> {
        Ok(self.lock().users.get(&id).cloned())
    }

    async fn find_by_email(&self, email: &Email) -> Result<Option<User>, UserPersistenceError> {
        Ok(self
            .lock()
            .users
            .values()
            .find(|user| user.email() == email)
            .cloned())
    }

    async fn delete(&self, id: UserId) -> Result<bool, UserPersistenceError> {
        Ok(self.lock().remove_user(id))
    }
}

#[async_trait]
impl InvitationRepository for InMemoryStore {
    async fn create(
        &self,
        user: UserId,
        invitation: &NewInvitation,
    ) -> Result<(), InvitationPersistenceError> {
        let mut state = self.lock();
        if !state.users.contains_key(&user) {
            return Err(InvitationPersistenceError::unknown_user());
        }
        state.invitations.retain(|_, entry| entry.user_id != user);
        state.invitations.insert(
            invitation.digest.clone(),
            Invitation {
                user_id: user,
                expires_at: invitation.expires_at,
            },
        );
        Ok(())
    }

    async fn redeem(
        &self,
        digest: &InvitationDigest,
        now: DateTime<Utc>,
    ) -> Result<InvitationLookup, InvitationPersistenceError> {
        let mut state = self.lock();
        let removed = state.invitations.remove(digest);
        let purged = state.purge_expired_invitations(now);
        if purged > 0 {
            debug!(purged, "expired invitations purged");
        }
        let Some(entry) = removed else {
            return Ok(InvitationLookup::Missing);
        };
        if entry.expires_at <= now {
            return Ok(InvitationLookup::Expired);
        }
        let Some(user) = state.users.remove(&entry.user_id) else {
            return Ok(InvitationLookup::Missing);
        };
        let activated = user.activated();
        state.users.insert(entry.user_id, activated.clone());
        Ok(InvitationLookup::Consumed(activated))
    }
}

#[async_trait]
impl FollowRepository for InMemoryStore {
    async fn insert(&self, edge: FollowEdge) -> Result<(), FollowPersistenceError> {
        let mut state = self.lock();
        if !state.users.contains_key(&edge.follower())
            || !state.users.contains_key(&edge.followed())
        {
            return Err(FollowPersistenceError::unknown_user());
        }
        if !state.follows.insert((edge.follower(), edge.followed())) {
            return Err(FollowPersistenceError::duplicate_edge());
        }
        Ok(())
    }

    async fn remove(&self, edge: FollowEdge) -> Result<bool, FollowPersistenceError> {
        Ok(self
            .lock()
            .follows
            .remove(&(edge.follower(), edge.followed())))
    }
}

#[async_trait]
impl FeedRepository for InMemoryStore {
    async fn query_feed(
        &self,
        viewer: UserId,
        query: &FeedQuery,
    ) -> Result<Vec<FeedEntry>, FeedPersistenceError> {
        let state = self.lock();
        let mut posts: Vec<&Post> = state
            .posts
            .values()
            .filter(|post| {
                post.author_id == viewer || state.follows.contains(&(viewer, post.author_id))
            })
            .filter(|post| query.matches(post))
            .collect();
        posts.sort_by_key(|post| (post.created_at, post.id));
        if query.sort() == SortDirection::Desc {
            posts.reverse();
        }
        let offset = usize::try_from(query.offset()).unwrap_or(usize::MAX);
        let limit = usize::try_from(query.limit()).unwrap_or(usize::MAX);
        Ok(posts
            .into_iter()
            .skip(offset)
            .take(limit)
            .filter_map(|post| state.feed_entry(post))
            .collect())
    }
}

#[async_trait]
impl PostRepository for InMemoryStore {
    async fn insert(&self, post: &NewPost) -> Result<Post, PostPersistenceError> {
        let mut state = self.lock();
        if !state.users.contains_key(&post.author_id) {
            return Err(PostPersistenceError::query("post author does not exist"));
        }
        let id = state.allocate_post_id();
        let stored = Post {
            id,
            author_id: post.author_id,
            title: post.title.clone(),
            content: post.content.clone(),
            tags: post.tags.clone(),
            created_at: post.created_at,
            updated_at: post.created_at,
        };
        state.posts.insert(id, stored.clone());
        Ok(stored)
    }

    async fn find_by_id(&self, id: PostId) -> Result<Option<Post>, PostPersistenceError> {
        Ok(self.lock().posts.get(&id).cloned())
    }

    async fn update(
        &self,
        id: PostId,
        changes: &PostChanges,
        updated_at: DateTime<Utc>,
    ) -> Result<Option<Post>, PostPersistenceError> {
        let mut state = self.lock();
        let Some(post) = state.posts.get_mut(&id) else {
            return Ok(None);
        };
        changes.apply_to(post, updated_at);
        Ok(Some(post.clone()))
    }

    async fn delete(&self, id: PostId) -> Result<bool, PostPersistenceError> {
        Ok(self.lock().remove_post(id))
    }

    async fn insert_comment(&self, comment: &NewComment) -> Result<Comment, PostPersistenceError> {
        let mut state = self.lock();
        if !state.posts.contains_key(&comment.post_id) {
            return Err(PostPersistenceError::missing_post());
        }
        let id = state.allocate_comment_id();
        let stored = Comment {
            id,
            post_id: comment.post_id,
            author_id: comment.author_id,
            content: comment.content.clone(),
            created_at: comment.created_at,
        };
        state.comments.insert(id, stored.clone());
        Ok(stored)
    }

    async fn comments_for(&self, id: PostId) -> Result<Vec<Comment>, PostPersistenceError> {
        let state = self.lock();
        let mut comments: Vec<Comment> = state
            .comments
            .values()
            .filter(|comment| comment.post_id == id)
            .cloned()
            .collect();
        comments.sort_by_key(|comment| (comment.created_at, comment.id));
        Ok(comments)
    }

    async fn add_like(&self, id: PostId, user: UserId) -> Result<(), PostPersistenceError> {
        let mut state = self.lock();
        if !state.posts.contains_key(&id) {
            return Err(PostPersistenceError::missing_post());
        }
        state.likes.insert((id, user));
        Ok(())
    }
}

#[async_trait]
impl StoreProbe for InMemoryStore {
    async fn ping(&self) -> Result<(), StoreProbeError> {
        Ok(())
    }
}
