#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![cfg_attr(feature = "fail-on-warnings", deny(clippy::all))]

pub mod bucket;
mod classifier;
pub mod commands;
pub mod error;
mod event;
mod jobs;
pub mod primitives;
mod publisher;
mod tag;

use chrono::NaiveDate;
use tracing::instrument;

use core_lending::{BusinessDates, Loans, LoanProducts};
use job::{JobSchedule, Jobs};
use outbox::{Outbox, OutboxEventMarker};

pub use bucket::{DelinquencyBucket, DelinquencyBucketRepo, DelinquencyRange};
pub use classifier::{classify, ClassificationError};
use error::{CoreDelinquencyError, DelinquencySweepError};
pub use event::DelinquencyEvent;
pub use jobs::*;
use publisher::DelinquencyPublisher;
pub use tag::{DelinquencyTagRepo, InstallmentDelinquencyTag};

use primitives::*;

/// Delinquency classification: ageing-band configuration plus the engine
/// that keeps per-installment tags current.
pub struct Delinquencies<E>
where
    E: OutboxEventMarker<DelinquencyEvent>,
{
    buckets: DelinquencyBucketRepo,
    tags: DelinquencyTagRepo,
    loans: Loans,
    products: LoanProducts,
    publisher: DelinquencyPublisher<E>,
}

impl<E> Clone for Delinquencies<E>
where
    E: OutboxEventMarker<DelinquencyEvent>,
{
    fn clone(&self) -> Self {
        Self {
            buckets: self.buckets.clone(),
            tags: self.tags.clone(),
            loans: self.loans.clone(),
            products: self.products.clone(),
            publisher: self.publisher.clone(),
        }
    }
}

impl<E> Delinquencies<E>
where
    E: OutboxEventMarker<DelinquencyEvent>,
{
    pub fn new(loans: &Loans, products: &LoanProducts, outbox: &Outbox<E>) -> Self {
        Self {
            buckets: DelinquencyBucketRepo::new(),
            tags: DelinquencyTagRepo::new(),
            loans: loans.clone(),
            products: products.clone(),
            publisher: DelinquencyPublisher::new(outbox),
        }
    }

    /// Registers the nightly refresh sweep alongside the service.
    pub async fn init(
        jobs: &Jobs,
        loans: &Loans,
        products: &LoanProducts,
        business_dates: &BusinessDates,
        outbox: &Outbox<E>,
    ) -> Result<Self, CoreDelinquencyError> {
        let delinquencies = Self::new(loans, products, outbox);
        jobs.add_initializer(DelinquencyRefreshInit::new(&delinquencies, business_dates));
        if jobs
            .find_by_type(<DelinquencyRefreshInit<E> as job::JobInitializer>::job_type())
            .is_none()
        {
            jobs.create_and_spawn_with_schedule(
                DelinquencyRefreshJobConfig::<E>::new(),
                JobSchedule::cron("0 30 0 * * *")?,
            )?;
        }
        Ok(delinquencies)
    }

    #[instrument(name = "delinquency.range.create", skip(self))]
    pub fn create_range(
        &self,
        classification: impl Into<String> + std::fmt::Debug,
        min_age_days: u32,
        max_age_days: Option<u32>,
    ) -> DelinquencyRange {
        self.buckets.create_range(DelinquencyRange {
            id: DelinquencyRangeId::new(),
            classification: classification.into(),
            min_age_days,
            max_age_days,
        })
    }

    /// The label is the only mutable part of a range; the age band itself
    /// is fixed at creation.
    pub fn update_range_classification(
        &self,
        range_id: DelinquencyRangeId,
        classification: impl Into<String>,
    ) -> Result<DelinquencyRange, CoreDelinquencyError> {
        Ok(self
            .buckets
            .update_range_classification(range_id, classification.into())?)
    }

    #[instrument(name = "delinquency.bucket.create", skip(self, range_ids))]
    pub fn create_bucket(
        &self,
        name: impl Into<String> + std::fmt::Debug,
        range_ids: Vec<DelinquencyRangeId>,
    ) -> Result<DelinquencyBucket, CoreDelinquencyError> {
        let mut ranges = Vec::with_capacity(range_ids.len());
        for range_id in &range_ids {
            ranges.push(self.buckets.find_range(*range_id)?);
        }
        ranges.sort_by_key(|r| r.min_age_days);
        bucket::validate_cover(&ranges)?;

        let bucket = self.buckets.create_bucket(DelinquencyBucket {
            id: DelinquencyBucketId::new(),
            name: name.into(),
            range_ids: ranges.iter().map(|r| r.id).collect(),
        })?;
        Ok(bucket)
    }

    pub fn find_bucket(
        &self,
        bucket_id: DelinquencyBucketId,
    ) -> Result<DelinquencyBucket, CoreDelinquencyError> {
        Ok(self.buckets.find_bucket(bucket_id)?)
    }

    #[instrument(name = "delinquency.bucket.delete", skip(self), fields(bucket_id = %bucket_id))]
    pub fn delete_bucket(
        &self,
        bucket_id: DelinquencyBucketId,
    ) -> Result<(), CoreDelinquencyError> {
        let referents = self.products.referencing_bucket(bucket_id);
        if !referents.is_empty() {
            return Err(
                bucket::error::DelinquencyBucketError::BucketReferencedByProducts(referents)
                    .into(),
            );
        }
        Ok(self.buckets.delete_bucket(bucket_id)?)
    }

    pub fn tags_for_loan(&self, loan_id: LoanId) -> Vec<InstallmentDelinquencyTag> {
        self.tags.tags_for_loan(loan_id)
    }

    /// Lower bound (in days) of the oldest band the loan is tagged with, or
    /// `None` when the loan carries no tags. Ageing-based aggregation keys
    /// off this.
    pub fn oldest_tagged_age(&self, loan_id: LoanId) -> Result<Option<u32>, CoreDelinquencyError> {
        let mut oldest = None;
        for tag in self.tags.tags_for_loan(loan_id) {
            let range = self.buckets.find_range(tag.range_id)?;
            oldest = Some(std::cmp::max(oldest.unwrap_or(0), range.min_age_days));
        }
        Ok(oldest)
    }

    /// Reclassifies one loan and atomically swaps its tag set. Returns
    /// whether anything changed; an event is published only on change.
    /// A loan whose product carries no bucket simply has its tags cleared.
    #[instrument(name = "delinquency.refresh_loan_tags", skip(self), fields(loan_id = %loan_id))]
    pub async fn refresh_loan_tags(
        &self,
        loan_id: LoanId,
        as_of: NaiveDate,
    ) -> Result<bool, CoreDelinquencyError> {
        let loan = self.loans.find_loan(loan_id)?;
        let product = self.products.find_by_id(loan.product_id)?;

        let new_tags = match product.delinquency_bucket_id {
            Some(bucket_id) => {
                let ranges = self.buckets.ranges_of_bucket(bucket_id)?;
                let installments = self.loans.installments_for_loan(loan_id);
                classifier::classify(&installments, &ranges, as_of)?
            }
            None => Vec::new(),
        };
        let tagged_installments = new_tags.len();

        let changed = self.tags.replace_for_loan(loan_id, new_tags);
        if changed {
            self.publisher
                .publish(DelinquencyEvent::LoanTagsRefreshed {
                    loan_id,
                    as_of,
                    tagged_installments,
                })
                .await?;
        }
        Ok(changed)
    }

    /// Classifies every active loan whose product carries a bucket. Loans
    /// that fail stay isolated; the aggregate error surfaces afterwards.
    #[instrument(name = "delinquency.sweep", skip(self))]
    pub async fn sweep(&self, as_of: NaiveDate) -> Result<Vec<LoanId>, DelinquencySweepError> {
        let mut refreshed = Vec::new();
        let mut failures = Vec::new();
        for loan in self.loans.list_active_loans() {
            let has_bucket = self
                .products
                .find_by_id(loan.product_id)
                .map(|p| p.delinquency_bucket_id.is_some())
                .unwrap_or(false);
            if !has_bucket {
                continue;
            }
            match self.refresh_loan_tags(loan.id, as_of).await {
                Ok(true) => refreshed.push(loan.id),
                Ok(false) => {}
                Err(e) => {
                    tracing::error!(loan_id = %loan.id, error = %e, "loan classification failed");
                    failures.push((loan.id, e));
                }
            }
        }
        if failures.is_empty() {
            Ok(refreshed)
        } else {
            Err(DelinquencySweepError { failures })
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;
    use serde::{Deserialize, Serialize};

    use core_lending::primitives::*;
    use core_lending::{Loan, NewInstallment, NewLoan, NewLoanProduct};
    use outbox::{JsonEventSerializer, NullTransport};

    use super::*;

    #[derive(Debug, Serialize, Deserialize)]
    #[serde(untagged)]
    enum TestEvent {
        Delinquency(DelinquencyEvent),
    }

    impl From<DelinquencyEvent> for TestEvent {
        fn from(event: DelinquencyEvent) -> Self {
            TestEvent::Delinquency(event)
        }
    }

    impl OutboxEventMarker<DelinquencyEvent> for TestEvent {
        fn as_event(&self) -> Option<&DelinquencyEvent> {
            let TestEvent::Delinquency(event) = self;
            Some(event)
        }
    }

    struct Fixture {
        loans: Loans,
        products: LoanProducts,
        outbox: Outbox<TestEvent>,
        delinquencies: Delinquencies<TestEvent>,
    }

    fn fixture() -> Fixture {
        let loans = Loans::new();
        let products = LoanProducts::new();
        let outbox: Outbox<TestEvent> =
            Outbox::init(vec![Box::new(JsonEventSerializer)], Box::new(NullTransport));
        let delinquencies = Delinquencies::new(&loans, &products, &outbox);
        Fixture {
            loans,
            products,
            outbox,
            delinquencies,
        }
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn standard_bucket(fixture: &Fixture) -> DelinquencyBucket {
        let ranges = vec![
            fixture.delinquencies.create_range("current", 0, Some(30)).id,
            fixture.delinquencies.create_range("31-60", 31, Some(60)).id,
            fixture.delinquencies.create_range("over-60", 61, None).id,
        ];
        fixture
            .delinquencies
            .create_bucket("standard-ageing", ranges)
            .unwrap()
    }

    fn loan_with_bucket(fixture: &Fixture, due: NaiveDate, cents: u64) -> Loan {
        let bucket = standard_bucket(fixture);
        let product = fixture.products.create_product(
            NewLoanProduct::builder()
                .id(LoanProductId::new())
                .name("standard-term")
                .delinquency_bucket_id(bucket.id)
                .build()
                .unwrap(),
        );
        fixture.loans.create_loan(
            NewLoan::builder()
                .id(LoanId::new())
                .office_id(OfficeId::new())
                .product_id(product.id)
                .disbursed_on(date(2026, 1, 1))
                .schedule(vec![NewInstallment::builder()
                    .number(1)
                    .due_date(due)
                    .principal(UsdCents::from(cents))
                    .build()
                    .unwrap()])
                .build()
                .unwrap(),
        )
    }

    #[test]
    fn bucket_with_gap_is_rejected() {
        let fixture = fixture();
        let ranges = vec![
            fixture.delinquencies.create_range("current", 0, Some(30)).id,
            // gap: 31 is uncovered
            fixture.delinquencies.create_range("late", 32, None).id,
        ];
        let err = fixture
            .delinquencies
            .create_bucket("gappy", ranges)
            .unwrap_err();
        assert!(matches!(
            err,
            error::CoreDelinquencyError::Bucket(
                bucket::error::DelinquencyBucketError::GapOrOverlapBetweenRanges { .. }
            )
        ));
    }

    #[test]
    fn bucket_must_cover_zero_and_be_open_ended() {
        let fixture = fixture();
        let ranges = vec![
            fixture.delinquencies.create_range("late", 1, Some(30)).id,
            fixture.delinquencies.create_range("later", 31, None).id,
        ];
        assert!(matches!(
            fixture.delinquencies.create_bucket("no-zero", ranges).unwrap_err(),
            error::CoreDelinquencyError::Bucket(
                bucket::error::DelinquencyBucketError::FirstRangeMustStartAtZero(1)
            )
        ));

        let ranges = vec![fixture.delinquencies.create_range("only", 0, Some(90)).id];
        assert!(matches!(
            fixture.delinquencies.create_bucket("capped", ranges).unwrap_err(),
            error::CoreDelinquencyError::Bucket(
                bucket::error::DelinquencyBucketError::LastRangeMustBeUnbounded(90)
            )
        ));
    }

    #[test]
    fn range_relabel_keeps_the_band_and_reaches_the_bucket() {
        let fixture = fixture();
        let renamed = fixture.delinquencies.create_range("sub-standard", 31, Some(60));
        let range_ids = vec![
            fixture.delinquencies.create_range("current", 0, Some(30)).id,
            renamed.id,
            fixture.delinquencies.create_range("doubtful", 61, None).id,
        ];
        let bucket = fixture
            .delinquencies
            .create_bucket("relabeled-ageing", range_ids)
            .unwrap();

        let updated = fixture
            .delinquencies
            .update_range_classification(renamed.id, "watch-list")
            .unwrap();
        assert_eq!(updated.classification, "watch-list");
        assert_eq!(updated.min_age_days, 31);
        assert_eq!(updated.max_age_days, Some(60));

        let resolved = fixture.delinquencies.buckets.ranges_of_bucket(bucket.id).unwrap();
        assert_eq!(resolved[1].classification, "watch-list");
        assert_eq!(resolved[1].min_age_days, 31);
    }

    #[test]
    fn duplicate_bucket_name_is_rejected() {
        let fixture = fixture();
        standard_bucket(&fixture);
        let ranges = vec![fixture.delinquencies.create_range("all", 0, None).id];
        assert!(matches!(
            fixture
                .delinquencies
                .create_bucket("standard-ageing", ranges)
                .unwrap_err(),
            error::CoreDelinquencyError::Bucket(
                bucket::error::DelinquencyBucketError::DuplicateBucketName(_)
            )
        ));
    }

    #[tokio::test]
    async fn bucket_cannot_be_deleted_while_referenced() {
        let fixture = fixture();
        let loan = loan_with_bucket(&fixture, date(2026, 1, 31), 10_000);
        let product = fixture.products.find_by_id(loan.product_id).unwrap();
        let bucket_id = product.delinquency_bucket_id.unwrap();

        assert!(matches!(
            fixture.delinquencies.delete_bucket(bucket_id).unwrap_err(),
            error::CoreDelinquencyError::Bucket(
                bucket::error::DelinquencyBucketError::BucketReferencedByProducts(ids)
            ) if ids == vec![product.id]
        ));

        fixture
            .products
            .assign_delinquency_bucket(product.id, None)
            .unwrap();
        fixture.delinquencies.delete_bucket(bucket_id).unwrap();
    }

    #[tokio::test]
    async fn overdue_installment_is_tagged_with_its_band() {
        let fixture = fixture();
        // due 2026-01-31, classified 45 days later
        let loan = loan_with_bucket(&fixture, date(2026, 1, 31), 10_000);
        let as_of = date(2026, 3, 17);

        let changed = fixture
            .delinquencies
            .refresh_loan_tags(loan.id, as_of)
            .await
            .unwrap();
        assert!(changed);

        let tags = fixture.delinquencies.tags_for_loan(loan.id);
        assert_eq!(tags.len(), 1);
        assert_eq!(tags[0].classification, "31-60");
        assert_eq!(tags[0].outstanding, UsdCents::from(10_000));
        assert_eq!(tags[0].added_on, as_of);
    }

    #[tokio::test]
    async fn refresh_is_idempotent_and_publishes_once() {
        let fixture = fixture();
        let loan = loan_with_bucket(&fixture, date(2026, 1, 31), 10_000);
        let as_of = date(2026, 3, 17);

        assert!(fixture
            .delinquencies
            .refresh_loan_tags(loan.id, as_of)
            .await
            .unwrap());
        assert!(!fixture
            .delinquencies
            .refresh_loan_tags(loan.id, as_of)
            .await
            .unwrap());

        let events = fixture.outbox.events_after(outbox::EventSequence::BEGIN);
        assert_eq!(events.len(), 1);
        assert!(matches!(
            events[0].as_event::<DelinquencyEvent>(),
            Some(DelinquencyEvent::LoanTagsRefreshed {
                tagged_installments: 1,
                ..
            })
        ));
    }

    #[tokio::test]
    async fn fully_paid_loan_carries_no_tags() {
        let fixture = fixture();
        let loan = loan_with_bucket(&fixture, date(2026, 1, 31), 10_000);
        fixture
            .loans
            .record_repayment(loan.id, UsdCents::from(10_000))
            .unwrap();

        let changed = fixture
            .delinquencies
            .refresh_loan_tags(loan.id, date(2026, 3, 17))
            .await
            .unwrap();
        assert!(!changed);
        assert!(fixture.delinquencies.tags_for_loan(loan.id).is_empty());
    }

    #[tokio::test]
    async fn sweep_skips_loans_without_bucket_and_reports_refreshed() {
        let fixture = fixture();
        let tagged = loan_with_bucket(&fixture, date(2026, 1, 31), 10_000);

        let bucketless_product = fixture.products.create_product(
            NewLoanProduct::builder()
                .id(LoanProductId::new())
                .name("no-classification")
                .build()
                .unwrap(),
        );
        let untagged = fixture.loans.create_loan(
            NewLoan::builder()
                .id(LoanId::new())
                .office_id(OfficeId::new())
                .product_id(bucketless_product.id)
                .disbursed_on(date(2026, 1, 1))
                .schedule(vec![NewInstallment::builder()
                    .number(1)
                    .due_date(date(2026, 1, 31))
                    .principal(UsdCents::from(5_000))
                    .build()
                    .unwrap()])
                .build()
                .unwrap(),
        );

        let refreshed = fixture.delinquencies.sweep(date(2026, 3, 17)).await.unwrap();
        assert_eq!(refreshed, vec![tagged.id]);
        assert!(fixture.delinquencies.tags_for_loan(untagged.id).is_empty());
    }
}

