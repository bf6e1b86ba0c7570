use sqlx::Executor;

use crate::connection::DbPool;
use crate::repositories::RepositoryError;

/// Canonical demo seeds and verification contract for local development.
///
/// Seeds tenders and proposals only. Approvals are deliberately absent:
/// they carry crypto-random tokens and must be issued through the create
/// operation, never fixed in a fixture.
const SEED_TENDERS: &[SeedTenderContract] = &[
    SeedTenderContract {
        tender_id: "tender-demo-001",
        code: "LIC-2026-001",
        status: "published",
        expected_proposal_count: 2,
        description: "Core network refresh - two competing proposals",
    },
    SeedTenderContract {
        tender_id: "tender-demo-002",
        code: "LIC-2026-002",
        status: "published",
        expected_proposal_count: 1,
        description: "Helpdesk platform licensing - single proposal",
    },
];

const SEED_PROPOSAL_IDS: &[&str] = &["prop-demo-001", "prop-demo-002", "prop-demo-003"];

pub struct DemoSeedDataset;

impl DemoSeedDataset {
    /// SQL fixture content for the demo seed data.
    pub const SQL: &str = include_str!("../../../config/fixtures/demo_seed_data.sql");

    /// Load the demo dataset into the database. Safe to re-run.
    pub async fn load(pool: &DbPool) -> Result<SeedResult, RepositoryError> {
        let mut tx = pool.begin().await?;
        tx.execute(sqlx::query(Self::SQL)).await?;
        tx.commit().await?;

        let tenders_seeded = SEED_TENDERS
            .iter()
            .map(|tender| TenderSeedInfo {
                tender_id: tender.tender_id,
                code: tender.code,
                description: tender.description,
            })
            .collect::<Vec<_>>();

        Ok(SeedResult { tenders_seeded, proposals_seeded: SEED_PROPOSAL_IDS.len() })
    }

    /// Verify that seed data exists and matches the contract.
    pub async fn verify(pool: &DbPool) -> Result<VerificationResult, RepositoryError> {
        let mut checks = Vec::new();

        for tender in SEED_TENDERS {
            let tender_exists: i64 = sqlx::query_scalar(
                "SELECT EXISTS(SELECT 1 FROM tender WHERE id = ?1 AND code = ?2 AND status = ?3)",
            )
            .bind(tender.tender_id)
            .bind(tender.code)
            .bind(tender.status)
            .fetch_one(pool)
            .await?;
            checks.push((tender.tender_id, tender_exists == 1));

            let proposal_count: i64 =
                sqlx::query_scalar("SELECT COUNT(1) FROM proposal WHERE tender_id = ?1")
                    .bind(tender.tender_id)
                    .fetch_one(pool)
                    .await?;
            checks.push((
                tender.proposal_count_label(),
                proposal_count == tender.expected_proposal_count,
            ));
        }

        let quoted_proposals = sql_array_from_ids(SEED_PROPOSAL_IDS);
        let proposal_total: i64 = sqlx::query_scalar(&format!(
            "SELECT COUNT(1) FROM proposal WHERE id IN {quoted_proposals}"
        ))
        .fetch_one(pool)
        .await?;
        checks.push(("seed-proposals", proposal_total == SEED_PROPOSAL_IDS.len() as i64));

        let approvals_absent: i64 = sqlx::query_scalar(&format!(
            "SELECT COUNT(1) FROM approval WHERE proposal_id IN {quoted_proposals}"
        ))
        .fetch_one(pool)
        .await?;
        checks.push(("no-seeded-approvals", approvals_absent == 0));

        let all_present = checks.iter().all(|(_, ok)| *ok);
        Ok(VerificationResult { all_present, checks })
    }

    /// Clean up seeded fixtures from a test database.
    pub async fn clean(pool: &DbPool) -> Result<(), RepositoryError> {
        let mut tx = pool.begin().await?;

        let quoted_proposals = sql_array_from_ids(SEED_PROPOSAL_IDS);
        let tender_ids: Vec<&str> = SEED_TENDERS.iter().map(|t| t.tender_id).collect();
        let quoted_tenders = sql_array_from_ids(&tender_ids);

        sqlx::query(&format!(
            "DELETE FROM approval \
             WHERE proposal_id IN {quoted_proposals} OR tender_id IN {quoted_tenders}"
        ))
        .execute(&mut *tx)
        .await?;
        sqlx::query(&format!("DELETE FROM proposal WHERE id IN {quoted_proposals}"))
            .execute(&mut *tx)
            .await?;
        sqlx::query(&format!("DELETE FROM tender WHERE id IN {quoted_tenders}"))
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(())
    }
}

#[derive(Debug, Clone, Copy)]
struct SeedTenderContract {
    tender_id: &'static str,
    code: &'static str,
    status: &'static str,
    expected_proposal_count: i64,
    description: &'static str,
}

impl SeedTenderContract {
    fn proposal_count_label(&self) -> &'static str {
        match self.tender_id {
            "tender-demo-001" => "tender-demo-001-proposal-count",
            _ => "tender-demo-002-proposal-count",
        }
    }
}

fn sql_array_from_ids(ids: &[&str]) -> String {
    let quoted = ids.iter().map(|id| format!("'{}'", id)).collect::<Vec<_>>().join(",");
    format!("({quoted})")
}

#[derive(Debug)]
pub struct SeedResult {
    pub tenders_seeded: Vec<TenderSeedInfo>,
    pub proposals_seeded: usize,
}

#[derive(Debug)]
pub struct TenderSeedInfo {
    pub tender_id: &'static str,
    pub code: &'static str,
    pub description: &'static str,
}

#[derive(Debug)]
pub struct VerificationResult {
    pub all_present: bool,
    pub checks: Vec<(&'static str, bool)>,
}
