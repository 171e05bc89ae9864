//! Cascading relational deletion of a club's rows.
//!
//! The order is owned by [`PURGE_ORDER`](clubhouse_core::club_lifecycle::PURGE_ORDER);
//! this repo only knows the SQL for each step. No foreign key in the schema
//! cascades, so running steps out of order fails with a FK violation.

use clubhouse_core::club_lifecycle::PurgeStep;
use clubhouse_core::types::DbId;

use crate::DbTx;

/// SQL for a single purge step. `$1` is always the club id.
pub fn purge_sql(step: PurgeStep) -> &'static str {
    match step {
        PurgeStep::ClearDefaultMembershipType => {
            "UPDATE clubs SET default_membership_type_id = NULL \
             WHERE id = $1 AND default_membership_type_id IS NOT NULL"
        }
        PurgeStep::ClearLogo => {
            "UPDATE clubs SET logo_file_id = NULL WHERE id = $1 AND logo_file_id IS NOT NULL"
        }
        PurgeStep::StatusTransitions => {
            "DELETE FROM member_status_transitions \
             WHERE club_id = $1 OR member_id IN (SELECT id FROM members WHERE club_id = $1)"
        }
        PurgeStep::MembershipPeriods => {
            "DELETE FROM membership_periods \
             WHERE member_id IN (SELECT id FROM members WHERE club_id = $1)"
        }
        PurgeStep::GroupAssignments => {
            "DELETE FROM member_group_assignments \
             WHERE member_id IN (SELECT id FROM members WHERE club_id = $1) \
                OR group_id IN (SELECT id FROM member_groups WHERE club_id = $1)"
        }
        PurgeStep::ClubFiles => "DELETE FROM club_files WHERE club_id = $1",
        PurgeStep::Members => "DELETE FROM members WHERE club_id = $1",
        PurgeStep::MemberGroups => "DELETE FROM member_groups WHERE club_id = $1",
        PurgeStep::MembershipTypes => "DELETE FROM membership_types WHERE club_id = $1",
        PurgeStep::ClubMemberships => "DELETE FROM club_memberships WHERE club_id = $1",
        PurgeStep::ClubSettings => "DELETE FROM club_settings WHERE club_id = $1",
    }
}

pub struct ClubPurgeRepo;

impl ClubPurgeRepo {
    /// Run one purge step. Returns the number of rows affected.
    pub async fn run_step(
        tx: &mut DbTx<'_>,
        step: PurgeStep,
        club_id: DbId,
    ) -> Result<u64, sqlx::Error> {
        let result = sqlx::query(purge_sql(step))
            .bind(club_id)
            .execute(&mut **tx)
            .await?;
        tracing::debug!(club_id, ?step, rows = result.rows_affected(), "Purge step executed");
        Ok(result.rows_affected())
    }
}

#[cfg(test)]
mod tests {
    use clubhouse_core::club_lifecycle::PURGE_ORDER;

    use super::*;

    #[test]
    fn every_step_targets_its_table() {
        for step in PURGE_ORDER {
            let sql = purge_sql(*step);
            assert!(
                sql.contains(step.table()),
                "SQL for {step:?} does not mention {}",
                step.table()
            );
        }
    }

    #[test]
    fn pointer_steps_update_instead_of_delete() {
        for step in [PurgeStep::ClearDefaultMembershipType, PurgeStep::ClearLogo] {
            assert!(purge_sql(step).starts_with("UPDATE clubs"));
        }
    }

    #[test]
    fn delete_steps_are_scoped_to_the_club() {
        for step in PURGE_ORDER {
            assert!(purge_sql(*step).contains("$1"), "{step:?} is not scoped");
        }
    }
}
