use std::collections::{HashSet, VecDeque};

use tracing::{debug, error, instrument, warn};

use crate::{
    access::directory::ReportingDirectory,
    model::{role::Role, user::UserId},
};

/// Decides whether `current_user_id`, acting with `current_user_role`, may see
/// data belonging to `target_user_id`.
///
/// Everybody may see themselves and admins may see everyone. Managers see
/// their whole subtree. Employees see nobody else. Lookup failures deny.
#[instrument(skip(directory))]
pub async fn check_user_access<D>(
    directory: &D,
    current_user_id: UserId,
    current_user_role: Role,
    target_user_id: UserId,
) -> bool
where
    D: ReportingDirectory + Sync + ?Sized,
{
    if current_user_id == target_user_id {
        return true;
    }

    match current_user_role {
        Role::Admin => true,
        Role::Manager => match directory
            .is_direct_report(current_user_id, target_user_id)
            .await
        {
            Ok(true) => true,
            Ok(false) => is_indirect_report(directory, current_user_id, target_user_id).await,
            Err(e) => {
                error!(error = %e, "Direct report lookup failed, denying access");
                false
            }
        },
        Role::Employee => false,
    }
}

/// True when `employee_id` sits two or more levels below `manager_id`.
///
/// Never fails: a directory error is logged and reported as `false`.
#[instrument(skip(directory))]
pub async fn is_indirect_report<D>(directory: &D, manager_id: UserId, employee_id: UserId) -> bool
where
    D: ReportingDirectory + Sync + ?Sized,
{
    match search_below_reports(directory, manager_id, employee_id).await {
        Ok(found) => found,
        Err(e) => {
            error!(error = %e, "Indirect report lookup failed, denying access");
            false
        }
    }
}

async fn search_below_reports<D>(
    directory: &D,
    manager_id: UserId,
    employee_id: UserId,
) -> Result<bool, sqlx::Error>
where
    D: ReportingDirectory + Sync + ?Sized,
{
    let mut visited = HashSet::from([manager_id]);
    let mut pending = directory.direct_reports(manager_id).await?;

    while let Some(report_id) = pending.pop() {
        if !visited.insert(report_id) {
            warn!(manager_id, report_id, "Reporting cycle detected, skipping");
            continue;
        }

        if directory.is_direct_report(report_id, employee_id).await? {
            debug!(via = report_id, "Indirect report found");
            return Ok(true);
        }

        pending.extend(directory.direct_reports(report_id).await?);
    }

    Ok(false)
}

/// Every active user below `manager_id`, in breadth-first order.
#[instrument(skip(directory))]
pub async fn collect_reports<D>(directory: &D, manager_id: UserId) -> Result<Vec<UserId>, sqlx::Error>
where
    D: ReportingDirectory + Sync + ?Sized,
{
    let mut visited = HashSet::from([manager_id]);
    let mut queue = VecDeque::from([manager_id]);
    let mut reports = Vec::new();

    while let Some(current) = queue.pop_front() {
        for report_id in directory.direct_reports(current).await? {
            if visited.insert(report_id) {
                reports.push(report_id);
                queue.push_back(report_id);
            } else {
                warn!(manager_id = current, report_id, "Reporting cycle detected, skipping");
            }
        }
    }

    Ok(reports)
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct Member {
        id: UserId,
        manager_id: Option<UserId>,
        is_active: bool,
    }

    #[derive(Default)]
    struct InMemoryDirectory {
        members: Vec<Member>,
        broken_manager: Option<UserId>,
        queries: AtomicUsize,
    }

    impl InMemoryDirectory {
        fn with(mut self, id: UserId, manager_id: Option<UserId>) -> Self {
            self.members.push(Member {
                id,
                manager_id,
                is_active: true,
            });
            self
        }

        fn with_inactive(mut self, id: UserId, manager_id: Option<UserId>) -> Self {
            self.members.push(Member {
                id,
                manager_id,
                is_active: false,
            });
            self
        }

        fn failing_for(mut self, manager_id: UserId) -> Self {
            self.broken_manager = Some(manager_id);
            self
        }

        fn check(&self, manager_id: UserId) -> Result<(), sqlx::Error> {
            self.queries.fetch_add(1, Ordering::SeqCst);
            if self.broken_manager == Some(manager_id) {
                return Err(sqlx::Error::PoolTimedOut);
            }
            Ok(())
        }
    }

    #[async_trait]
    impl ReportingDirectory for InMemoryDirectory {
        async fn is_direct_report(
            &self,
            manager_id: UserId,
            employee_id: UserId,
        ) -> Result<bool, sqlx::Error> {
            self.check(manager_id)?;
            Ok(self
                .members
                .iter()
                .any(|m| m.id == employee_id && m.manager_id == Some(manager_id) && m.is_active))
        }

        async fn direct_reports(&self, manager_id: UserId) -> Result<Vec<UserId>, sqlx::Error> {
            self.check(manager_id)?;
            Ok(self
                .members
                .iter()
                .filter(|m| m.manager_id == Some(manager_id) && m.is_active)
                .map(|m| m.id)
                .collect())
        }
    }

    //  1 (admin)
    //  ├── 2 (manager)
    //  │   ├── 3 ── 5 ── 6
    //  │   └── 4 ── 7 (inactive) ── 8
    //  └── 9 (manager)
    //      └── 10
    fn org() -> InMemoryDirectory {
        InMemoryDirectory::default()
            .with(1, None)
            .with(2, Some(1))
            .with(3, Some(2))
            .with(4, Some(2))
            .with(5, Some(3))
            .with(6, Some(5))
            .with_inactive(7, Some(4))
            .with(8, Some(7))
            .with(9, Some(1))
            .with(10, Some(9))
    }

    // 20 -> 21 -> 22 -> 20, with 23 hanging off 22
    fn org_with_cycle() -> InMemoryDirectory {
        InMemoryDirectory::default()
            .with(20, Some(22))
            .with(21, Some(20))
            .with(22, Some(21))
            .with(23, Some(22))
    }

    #[actix_web::test]
    async fn manager_sees_direct_report() {
        assert!(check_user_access(&org(), 2, Role::Manager, 3).await);
        assert!(check_user_access(&org(), 2, Role::Manager, 4).await);
    }

    #[actix_web::test]
    async fn manager_sees_reports_at_any_depth() {
        let dir = org();
        assert!(check_user_access(&dir, 2, Role::Manager, 5).await);
        assert!(check_user_access(&dir, 2, Role::Manager, 6).await);
        assert!(check_user_access(&dir, 1, Role::Manager, 6).await);
        assert!(check_user_access(&dir, 1, Role::Manager, 10).await);
    }

    #[actix_web::test]
    async fn manager_does_not_see_outside_subtree() {
        let dir = org();
        assert!(!check_user_access(&dir, 2, Role::Manager, 10).await);
        assert!(!check_user_access(&dir, 2, Role::Manager, 9).await);
        assert!(!check_user_access(&dir, 2, Role::Manager, 1).await);
        assert!(!check_user_access(&dir, 5, Role::Manager, 3).await);
    }

    #[actix_web::test]
    async fn everyone_sees_themselves() {
        let dir = org();
        for role in [Role::Admin, Role::Manager, Role::Employee] {
            assert!(check_user_access(&dir, 6, role, 6).await);
        }
        assert_eq!(dir.queries.load(Ordering::SeqCst), 0);
    }

    #[actix_web::test]
    async fn admin_sees_everyone() {
        let dir = org();
        for target in [1, 2, 6, 8, 10, 404] {
            assert!(check_user_access(&dir, 9, Role::Admin, target).await);
        }
    }

    #[actix_web::test]
    async fn employee_sees_nobody_else() {
        // 3 manages 5 in the tree, but the role decides.
        assert!(!check_user_access(&org(), 3, Role::Employee, 5).await);
        assert!(!check_user_access(&org(), 3, Role::Employee, 2).await);
    }

    #[actix_web::test]
    async fn inactive_user_breaks_the_chain() {
        let dir = org();
        assert!(!check_user_access(&dir, 2, Role::Manager, 7).await);
        assert!(!check_user_access(&dir, 2, Role::Manager, 8).await);
        assert!(!check_user_access(&dir, 4, Role::Manager, 8).await);
    }

    #[actix_web::test]
    async fn indirect_lookup_skips_direct_reports() {
        let dir = org();
        assert!(!is_indirect_report(&dir, 2, 3).await);
        assert!(is_indirect_report(&dir, 2, 5).await);
    }

    #[actix_web::test]
    async fn manager_without_reports_stops_after_one_query() {
        let dir = org();
        assert!(!is_indirect_report(&dir, 10, 3).await);
        assert_eq!(dir.queries.load(Ordering::SeqCst), 1);
    }

    #[actix_web::test]
    async fn cycle_in_reporting_lines_terminates() {
        let dir = org_with_cycle();
        assert!(!is_indirect_report(&dir, 20, 99).await);
        assert!(check_user_access(&dir, 20, Role::Manager, 23).await);
        assert!(check_user_access(&dir, 21, Role::Manager, 20).await);
    }

    #[actix_web::test]
    async fn lookup_failure_denies_access() {
        let dir = org().failing_for(2);
        assert!(!check_user_access(&dir, 2, Role::Manager, 3).await);

        let dir = org().failing_for(5);
        assert!(!check_user_access(&dir, 2, Role::Manager, 6).await);
        assert!(!is_indirect_report(&dir, 2, 6).await);
    }

    #[actix_web::test]
    async fn failure_elsewhere_in_the_tree_does_not_block_a_hit() {
        let dir = org().failing_for(9);
        assert!(check_user_access(&dir, 2, Role::Manager, 6).await);
    }

    #[actix_web::test]
    async fn collects_whole_subtree() {
        let mut reports = collect_reports(&org(), 2).await.unwrap();
        reports.sort_unstable();
        assert_eq!(reports, vec![3, 4, 5, 6]);

        assert!(collect_reports(&org(), 10).await.unwrap().is_empty());
    }

    #[actix_web::test]
    async fn collecting_through_a_cycle_excludes_the_root() {
        let mut reports = collect_reports(&org_with_cycle(), 20).await.unwrap();
        reports.sort_unstable();
        assert_eq!(reports, vec![21, 22, 23]);
    }

    #[actix_web::test]
    async fn collecting_propagates_failures() {
        let dir = org().failing_for(3);
        assert!(collect_reports(&dir, 2).await.is_err());
    }
}
