use super::QuizError;
use crate::catalog::Catalog;
use crate::random::shuffle;
use crate::types::{CategoryFilter, Question};
use rand::Rng;

/// Draw up to `count` randomly ordered questions matching `filter`.
/// An empty draw (no match or `count == 0`) is an error.
///
/// Earlier rounds are not taken into account; the same question may come up
/// again in the next draw.
pub fn select_round<R: Rng + ?Sized>(
    catalog: &Catalog,
    filter: &CategoryFilter,
    count: usize,
    rng: &mut R,
) -> Result<Vec<Question>, QuizError> {
    let pool = catalog.filtered(filter);
    if pool.is_empty() || count == 0 {
        return Err(QuizError::NoQuestionsAvailable(filter.to_string()));
    }

    let mut drawn = shuffle(&pool, rng);
    drawn.truncate(count.min(pool.len()));
    Ok(drawn.into_iter().cloned().collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::tests::make_question;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::collections::HashSet;

    fn catalog() -> Catalog {
        let mut questions = Vec::new();
        for i in 0..6 {
            questions.push(make_question(&format!("x{}", i), "X"));
        }
        for i in 0..3 {
            questions.push(make_question(&format!("y{}", i), "Y"));
        }
        Catalog::new(questions).unwrap()
    }

    #[test]
    fn test_select_returns_min_of_pool_and_count() {
        let catalog = catalog();
        let mut rng = StdRng::seed_from_u64(5);

        for (filter, pool) in [
            (CategoryFilter::All, 9),
            (CategoryFilter::Only("X".into()), 6),
            (CategoryFilter::Only("Y".into()), 3),
        ] {
            for count in 1..12 {
                let round = select_round(&catalog, &filter, count, &mut rng).unwrap();
                assert_eq!(round.len(), count.min(pool));

                let ids: HashSet<_> = round.iter().map(|q| q.id.clone()).collect();
                assert_eq!(ids.len(), round.len(), "no duplicates");
                assert!(round.iter().all(|q| filter.matches(q)));
            }
        }
    }

    #[test]
    fn test_empty_category_is_an_error() {
        let catalog = catalog();
        let mut rng = StdRng::seed_from_u64(5);
        let err = select_round(&catalog, &CategoryFilter::Only("Z".into()), 5, &mut rng)
            .unwrap_err();
        assert_eq!(err, QuizError::NoQuestionsAvailable("Z".to_string()));
    }

    #[test]
    fn test_zero_count_is_an_error() {
        let catalog = catalog();
        let mut rng = StdRng::seed_from_u64(5);
        let err = select_round(&catalog, &CategoryFilter::All, 0, &mut rng).unwrap_err();
        assert_eq!(err, QuizError::NoQuestionsAvailable("All".to_string()));
    }

    #[test]
    fn test_draws_vary_between_rounds() {
        let catalog = catalog();
        let mut rng = StdRng::seed_from_u64(11);
        let draws: HashSet<Vec<String>> = (0..20)
            .map(|_| {
                select_round(&catalog, &CategoryFilter::All, 4, &mut rng)
                    .unwrap()
                    .into_iter()
                    .map(|q| q.id)
                    .collect()
            })
            .collect();
        assert!(draws.len() > 1);
    }
}
