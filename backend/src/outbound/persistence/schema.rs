//! Diesel table definitions for the PostgreSQL schema.
//!
//! These definitions must match the files under `backend/migrations`. The
//! `diesel print-schema` command regenerates them from a live database.

diesel::table! {
    /// Registered accounts.
    ///
    /// `username` and `email` carry unique constraints named
    /// `users_username_key` and `users_email_key`.
    users (id) {
        /// Store-assigned identifier.
        id -> Int8,
        /// Unique handle (max 100 characters).
        username -> Varchar,
        /// Unique, lower-cased email address (max 255 characters).
        email -> Varchar,
        /// Argon2id PHC string.
        password_hash -> Text,
        /// Set once the invitation has been redeemed.
        is_active -> Bool,
        /// Account creation timestamp.
        created_at -> Timestamptz,
    }
}

diesel::table! {
    /// Pending activation invitations, one per user at most.
    user_invitations (token_digest) {
        /// Hex SHA-256 digest of the plaintext token.
        token_digest -> Bpchar,
        /// Invited user; cascades on delete.
        user_id -> Int8,
        /// Instant after which the invitation no longer resolves.
        expires_at -> Timestamptz,
    }
}

diesel::table! {
    /// Directed follow edges.
    followers (follower_id, followed_id) {
        /// The user doing the following.
        follower_id -> Int8,
        /// The user being followed.
        followed_id -> Int8,
        /// When the edge was created.
        created_at -> Timestamptz,
    }
}

diesel::table! {
    /// User-authored posts.
    posts (id) {
        /// Store-assigned identifier.
        id -> Int8,
        /// Author; cascades on delete.
        user_id -> Int8,
        /// Title (max 100 characters).
        title -> Varchar,
        /// Body (max 200 characters).
        content -> Varchar,
        /// Distinct tags in insertion order.
        tags -> Array<Text>,
        /// Creation timestamp.
        created_at -> Timestamptz,
        /// Last modification timestamp.
        updated_at -> Timestamptz,
    }
}

diesel::table! {
    /// Comments attached to posts.
    comments (id) {
        /// Store-assigned identifier.
        id -> Int8,
        /// Parent post; cascades on delete.
        post_id -> Int8,
        /// Comment author.
        user_id -> Int8,
        /// Body (max 200 characters).
        content -> Varchar,
        /// Creation timestamp.
        created_at -> Timestamptz,
    }
}

diesel::table! {
    /// One row per user liking a post.
    post_likes (post_id, user_id) {
        /// Liked post.
        post_id -> Int8,
        /// User who liked it.
        user_id -> Int8,
        /// When the like was recorded.
        created_at -> Timestamptz,
    }
}

diesel::joinable!(user_invitations -> users (user_id));
diesel::joinable!(posts -> users (user_id));
diesel::joinable!(comments -> posts (post_id));
diesel::joinable!(post_likes -> posts (post_id));

diesel::allow_tables_to_appear_in_same_query!(
    users,
    user_invitations,
    followers,
    posts,
    comments,
    post_likes,
);
