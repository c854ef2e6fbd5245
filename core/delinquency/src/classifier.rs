use chrono::NaiveDate;
use thiserror::Error;

use core_lending::Installment;

use crate::{bucket::DelinquencyRange, tag::InstallmentDelinquencyTag};

#[derive(Error, Debug)]
pub enum ClassificationError {
    #[error(
        "ClassificationError - BucketConfiguration: no range covers {days_past_due} days past due"
    )]
    BucketConfiguration { days_past_due: u32 },
}

/// Classifies each unpaid installment into its ageing band as of the given
/// date. `ranges` must be ordered by ascending `min_age_days`; the first
/// match wins. A miss means the bucket does not cover the whole age axis,
/// which is a configuration fault, not a skippable row.
pub fn classify(
    installments: &[Installment],
    ranges: &[DelinquencyRange],
    as_of: NaiveDate,
) -> Result<Vec<InstallmentDelinquencyTag>, ClassificationError> {
    let mut tags = Vec::new();
    for installment in installments {
        if installment.is_fully_paid() {
            continue;
        }
        let days_past_due = (as_of - installment.due_date).num_days().max(0) as u32;
        let range = ranges
            .iter()
            .find(|r| r.contains(days_past_due))
            .ok_or(ClassificationError::BucketConfiguration { days_past_due })?;
        tags.push(InstallmentDelinquencyTag {
            loan_id: installment.loan_id,
            installment_id: installment.id,
            range_id: range.id,
            classification: range.classification.clone(),
            outstanding: installment.total_outstanding(),
            added_on: as_of,
        });
    }
    Ok(tags)
}

#[cfg(test)]
mod tests {
    use core_lending::primitives::*;
    use core_lending::{NewInstallment, NewLoan};

    use crate::primitives::DelinquencyRangeId;

    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn standard_ranges() -> Vec<DelinquencyRange> {
        [
            ("current", 0, Some(30)),
            ("31-60", 31, Some(60)),
            ("over-60", 61, None),
        ]
        .into_iter()
        .map(|(label, min, max)| DelinquencyRange {
            id: DelinquencyRangeId::new(),
            classification: label.to_string(),
            min_age_days: min,
            max_age_days: max,
        })
        .collect()
    }

    fn installments(rows: Vec<(NaiveDate, u64)>) -> Vec<Installment> {
        let loans = core_lending::Loans::new();
        let schedule = rows
            .into_iter()
            .enumerate()
            .map(|(idx, (due, cents))| {
                NewInstallment::builder()
                    .number(idx as u32 + 1)
                    .due_date(due)
                    .principal(UsdCents::from(cents))
                    .build()
                    .unwrap()
            })
            .collect();
        let loan = loans.create_loan(
            NewLoan::builder()
                .id(LoanId::new())
                .office_id(OfficeId::new())
                .product_id(LoanProductId::new())
                .disbursed_on(date(2026, 1, 1))
                .schedule(schedule)
                .build()
                .unwrap(),
        );
        loans.installments_for_loan(loan.id)
    }

    #[test]
    fn forty_five_days_past_due_lands_in_middle_band() {
        let installments = installments(vec![(date(2026, 1, 31), 10_000)]);
        let tags = classify(&installments, &standard_ranges(), date(2026, 3, 17)).unwrap();
        assert_eq!(tags.len(), 1);
        assert_eq!(tags[0].classification, "31-60");
        assert_eq!(tags[0].outstanding, UsdCents::from(10_000));
    }

    #[test]
    fn due_today_classifies_into_zero_min_range() {
        let due = date(2026, 3, 17);
        let installments = installments(vec![(due, 5_000)]);
        let tags = classify(&installments, &standard_ranges(), due).unwrap();
        assert_eq!(tags[0].classification, "current");

        // not yet due behaves the same: days past due clamps at zero
        let tags = classify(&installments, &standard_ranges(), date(2026, 3, 1)).unwrap();
        assert_eq!(tags[0].classification, "current");
    }

    #[test]
    fn fully_paid_installments_produce_no_tag() {
        let installments = installments(vec![(date(2026, 1, 31), 0)]);
        let tags = classify(&installments, &standard_ranges(), date(2026, 3, 17)).unwrap();
        assert!(tags.is_empty());
    }

    #[test]
    fn uncovered_age_is_a_configuration_error() {
        let mut ranges = standard_ranges();
        ranges.pop();
        let installments = installments(vec![(date(2026, 1, 1), 10_000)]);
        let err = classify(&installments, &ranges, date(2026, 6, 1)).unwrap_err();
        assert!(matches!(
            err,
            ClassificationError::BucketConfiguration { days_past_due } if days_past_due > 60
        ));
    }
}
