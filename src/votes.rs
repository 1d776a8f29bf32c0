//! Like/dislike voting, shared by forum posts and replies.
//!
//! A voter holds at most one vote per entity. Repeating the same action
//! toggles the vote off; the opposite action moves the vote across in one
//! step. Each entity carries `likes`/`dislikes` counters plus `liked_by`/
//! `disliked_by` voter-id arrays, and the counters always equal the array
//! lengths.
//!
//! The whole read-modify-write is a single `UPDATE` whose `CASE` arms branch
//! on the row's pre-update membership. Two requests for the same entity
//! serialize on the row lock, so there is no window where a concurrent vote
//! can be lost or where a voter sits in both arrays.

use sqlx::PgPool;
use tracing::debug;
use uuid::Uuid;

use crate::error::ApiError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VoteAction {
    Like,
    Dislike,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VoteTarget {
    Forum,
    Reply,
}

impl VoteTarget {
    fn table(self) -> &'static str {
        match self {
            VoteTarget::Forum => "forums",
            VoteTarget::Reply => "replies",
        }
    }

    fn not_found(self) -> &'static str {
        match self {
            VoteTarget::Forum => "Post not found",
            VoteTarget::Reply => "Reply not found",
        }
    }
}

/// Builds the vote transition for one action as a single statement.
/// `$1` is the entity id, `$2` the voter id.
///
/// Reading the current membership first and issuing a second write would
/// open a lost-update window between the two statements; every branch here
/// sees one consistent snapshot of the row instead.
fn statement(target: VoteTarget, action: VoteAction) -> String {
    let table = target.table();
    let (count, set, other_count, other_set) = match action {
        VoteAction::Like => ("likes", "liked_by", "dislikes", "disliked_by"),
        VoteAction::Dislike => ("dislikes", "disliked_by", "likes", "liked_by"),
    };
    // Toggle-off leaves the opposite side untouched: the voter cannot be in
    // both arrays, so the unconditional array_remove on {other_set} is a
    // no-op in that branch.
    format!(
        "UPDATE {table} SET \
         {count} = CASE WHEN $2 = ANY({set}) THEN {count} - 1 ELSE {count} + 1 END, \
         {other_count} = CASE WHEN $2 = ANY({other_set}) AND NOT $2 = ANY({set}) \
             THEN {other_count} - 1 ELSE {other_count} END, \
         {set} = CASE WHEN $2 = ANY({set}) THEN array_remove({set}, $2) \
             ELSE array_append({set}, $2) END, \
         {other_set} = array_remove({other_set}, $2) \
         WHERE id = $1"
    )
}

/// Applies `action` by `voter` to the entity `id` of the given kind.
/// Voting on an entity that no longer exists is a 404, not a silent no-op.
pub async fn apply(
    db: &PgPool,
    target: VoteTarget,
    id: Uuid,
    voter: Uuid,
    action: VoteAction,
) -> Result<(), ApiError> {
    let result = sqlx::query(&statement(target, action))
        .bind(id)
        .bind(voter)
        .execute(db)
        .await?;

    if result.rows_affected() == 0 {
        return Err(ApiError::NotFound(target.not_found()));
    }

    debug!(%id, %voter, ?target, ?action, "vote applied");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;

    /// In-memory mirror of the SQL transition, one action at a time. Keeps
    /// the voting rules checkable without a database.
    #[derive(Debug, Clone, Default, PartialEq, Eq)]
    struct VoteState {
        likes: i32,
        dislikes: i32,
        liked_by: BTreeSet<Uuid>,
        disliked_by: BTreeSet<Uuid>,
    }

    impl VoteState {
        fn apply(&mut self, action: VoteAction, voter: Uuid) {
            match action {
                VoteAction::Like => {
                    if self.liked_by.remove(&voter) {
                        self.likes -= 1;
                    } else {
                        self.likes += 1;
                        self.liked_by.insert(voter);
                        if self.disliked_by.remove(&voter) {
                            self.dislikes -= 1;
                        }
                    }
                }
                VoteAction::Dislike => {
                    if self.disliked_by.remove(&voter) {
                        self.dislikes -= 1;
                    } else {
                        self.dislikes += 1;
                        self.disliked_by.insert(voter);
                        if self.liked_by.remove(&voter) {
                            self.likes -= 1;
                        }
                    }
                }
            }
        }

        fn check_invariants(&self) {
            assert_eq!(self.likes as usize, self.liked_by.len());
            assert_eq!(self.dislikes as usize, self.disliked_by.len());
            assert!(self.liked_by.is_disjoint(&self.disliked_by));
        }
    }

    #[test]
    fn double_like_restores_original_state() {
        let voter = Uuid::new_v4();
        let mut state = VoteState::default();
        state.apply(VoteAction::Dislike, Uuid::new_v4());
        let baseline = state.clone();

        state.apply(VoteAction::Like, voter);
        assert_ne!(state, baseline);
        state.apply(VoteAction::Like, voter);
        assert_eq!(state, baseline);
        assert!(!state.liked_by.contains(&voter));
    }

    #[test]
    fn like_then_dislike_moves_the_vote() {
        let voter = Uuid::new_v4();
        let mut state = VoteState::default();
        let baseline = state.clone();

        state.apply(VoteAction::Like, voter);
        state.apply(VoteAction::Dislike, voter);

        assert!(state.disliked_by.contains(&voter));
        assert!(!state.liked_by.contains(&voter));
        assert_eq!(state.dislikes, baseline.dislikes + 1);
        assert_eq!(state.likes, baseline.likes);
    }

    #[test]
    fn dislike_then_like_moves_the_vote_back() {
        let voter = Uuid::new_v4();
        let mut state = VoteState::default();

        state.apply(VoteAction::Dislike, voter);
        state.apply(VoteAction::Like, voter);

        assert!(state.liked_by.contains(&voter));
        assert!(!state.disliked_by.contains(&voter));
        assert_eq!(state.likes, 1);
        assert_eq!(state.dislikes, 0);
    }

    #[test]
    fn independent_voters_accumulate() {
        let (a, b) = (Uuid::new_v4(), Uuid::new_v4());
        let mut state = VoteState::default();

        state.apply(VoteAction::Like, a);
        state.apply(VoteAction::Like, b);

        assert_eq!(state.likes, 2);
        assert!(state.liked_by.contains(&a));
        assert!(state.liked_by.contains(&b));
    }

    #[test]
    fn invariants_hold_over_any_action_sequence() {
        let voters: Vec<Uuid> = (0..4).map(|_| Uuid::new_v4()).collect();
        let mut state = VoteState::default();

        for step in 0u32..64 {
            let voter = voters[(step % 4) as usize];
            let action = if (step / 3) % 2 == 0 {
                VoteAction::Like
            } else {
                VoteAction::Dislike
            };
            state.apply(action, voter);
            state.check_invariants();
        }
    }

    #[test]
    fn like_statement_targets_like_columns() {
        let sql = statement(VoteTarget::Forum, VoteAction::Like);
        assert!(sql.starts_with("UPDATE forums SET"));
        assert!(sql.contains("array_append(liked_by, $2)"));
        assert!(sql.contains("array_remove(disliked_by, $2)"));
        assert!(sql.ends_with("WHERE id = $1"));
    }

    #[test]
    fn dislike_statement_is_the_mirror() {
        let sql = statement(VoteTarget::Reply, VoteAction::Dislike);
        assert!(sql.starts_with("UPDATE replies SET"));
        assert!(sql.contains("array_append(disliked_by, $2)"));
        assert!(sql.contains("array_remove(liked_by, $2)"));
    }

    #[test]
    fn statements_are_a_single_update() {
        for target in [VoteTarget::Forum, VoteTarget::Reply] {
            for action in [VoteAction::Like, VoteAction::Dislike] {
                let sql = statement(target, action);
                assert_eq!(sql.matches("UPDATE").count(), 1);
                assert!(!sql.contains("SELECT"));
            }
        }
    }
}
