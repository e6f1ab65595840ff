//! # Recommendation Engine
//!
//! Owns one catalog snapshot and everything derived from it:
//! 1. Interaction matrix (built once)
//! 2. Popularity ranking (computed once)
//! 3. TF-IDF content model with a per-user profile cache
//! 4. Truncated SVD factors (fitted once)
//! 5. Nutrition post-processing
//!
//! A request picks a strategy, is scored, goes through the exclusion
//! filters, and finally through the nutrition filter. The engine is
//! immutable after construction and can be shared across threads in an
//! `Arc`; to pick up fresh data, build a new engine.

use std::sync::Arc;
use std::time::Instant;

use tracing::{debug, info, instrument};

use data_loader::{Catalog, RecipeId, UserId};
use pipeline::filters::{AlreadyRatedFilter, ExcludeRecipesFilter};
use pipeline::nutrition::validate_ceiling;
use pipeline::{FilterPipeline, HybridCombiner, NutritionFilter, NutritionPolicy, Recommendation};
use scorers::user_context::build_user_context;
use scorers::{
    CollaborativeScorer, ContentScorer, InteractionMatrix, Outcome, PopularityScorer,
    RankedCandidate, ScorerKind, TfidfVectorizer, UserContext,
};

use crate::config::EngineConfig;
use crate::error::{EngineError, Result};

/// One end-to-end recommendation request
#[derive(Debug, Clone)]
pub struct RecommendationRequest {
    /// Required for every strategy except popularity
    pub user_id: Option<UserId>,
    pub strategy: ScorerKind,
    pub top_n: usize,
    pub policy: NutritionPolicy,
    /// Overrides the ceiling derived from the user's daily budget
    pub calorie_ceiling: Option<f64>,
    /// Recipes never to return
    pub exclude: Vec<RecipeId>,
    /// Also drop every recipe the user already rated
    pub exclude_rated: bool,
    /// Hybrid sources for this request; the engine default otherwise
    pub hybrid_sources: Option<Vec<ScorerKind>>,
}

impl RecommendationRequest {
    pub fn new(strategy: ScorerKind, top_n: usize) -> Self {
        Self {
            user_id: None,
            strategy,
            top_n,
            policy: NutritionPolicy::default(),
            calorie_ceiling: None,
            exclude: Vec::new(),
            exclude_rated: false,
            hybrid_sources: None,
        }
    }

    pub fn for_user(mut self, user_id: UserId) -> Self {
        self.user_id = Some(user_id);
        self
    }

    pub fn with_policy(mut self, policy: NutritionPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn with_calorie_ceiling(mut self, ceiling: f64) -> Self {
        self.calorie_ceiling = Some(ceiling);
        self
    }

    pub fn excluding(mut self, recipes: impl IntoIterator<Item = RecipeId>) -> Self {
        self.exclude.extend(recipes);
        self
    }

    pub fn exclude_rated(mut self, yes: bool) -> Self {
        self.exclude_rated = yes;
        self
    }

    pub fn with_hybrid_sources(mut self, sources: Vec<ScorerKind>) -> Self {
        self.hybrid_sources = Some(sources);
        self
    }
}

/// Construct-once recommendation engine over a single catalog snapshot
pub struct RecommendationEngine {
    catalog: Arc<Catalog>,
    config: EngineConfig,
    popularity: PopularityScorer,
    content: ContentScorer,
    collaborative: CollaborativeScorer,
    nutrition: NutritionFilter,
}

impl RecommendationEngine {
    /// Build every scorer for `catalog`.
    ///
    /// The content model and the SVD are independent, so they are fitted
    /// in parallel.
    pub fn new(catalog: Arc<Catalog>, config: EngineConfig) -> Result<Self> {
        config.validate()?;
        let start_time = Instant::now();

        let matrix = Arc::new(InteractionMatrix::from_catalog(&catalog));
        let popularity = PopularityScorer::with_threshold(&catalog, config.positive_threshold);

        let vectorizer = TfidfVectorizer::new()
            .with_ngram_range(config.ngram_range.0, config.ngram_range.1)
            .with_min_df(config.min_df)
            .with_max_df(config.max_df);
        let (content, collaborative) = rayon::join(
            || ContentScorer::with_vectorizer(catalog.clone(), vectorizer),
            || CollaborativeScorer::new(catalog.clone(), matrix.clone(), &config.svd),
        );

        let nutrition = NutritionFilter::new(catalog.clone());

        let (users, recipes, interactions) = catalog.counts();
        info!(
            "Engine ready in {:.2?}: {} users, {} recipes, {} interactions, {} terms, {} latent factors",
            start_time.elapsed(),
            users,
            recipes,
            interactions,
            content.n_features(),
            collaborative.factors().rank()
        );

        Ok(Self {
            catalog,
            config,
            popularity,
            content,
            collaborative,
            nutrition,
        })
    }

    pub fn catalog(&self) -> &Arc<Catalog> {
        &self.catalog
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Global popularity ranking, best first
    pub fn rank_popular(&self) -> &[RankedCandidate] {
        self.popularity.rank()
    }

    pub fn recommend_content(&self, user_id: UserId) -> Outcome<Vec<RankedCandidate>> {
        self.content.recommend(user_id)
    }

    pub fn recommend_collaborative(&self, user_id: UserId) -> Outcome<Vec<RankedCandidate>> {
        self.collaborative.recommend(user_id)
    }

    /// Drop a memoized content profile; returns whether one was cached
    pub fn invalidate_profile(&self, user_id: UserId) -> bool {
        self.content.invalidate(user_id)
    }

    /// Inner-join several rankings, most significant first
    pub fn combine(&self, scorer_outputs: &[Vec<RankedCandidate>], top_n: usize) -> Vec<RankedCandidate> {
        HybridCombiner.combine(scorer_outputs, top_n)
    }

    /// Calorie and diet-label post-processing under an explicit ceiling
    pub fn apply_nutrition(
        &self,
        candidates: Vec<RankedCandidate>,
        calorie_ceiling: Option<f64>,
        top_n: usize,
        policy: NutritionPolicy,
    ) -> Result<Vec<Recommendation>> {
        Ok(self.nutrition.apply(candidates, calorie_ceiling, top_n, policy)?)
    }

    /// Per-meal ceiling for a user; `None` without a known budget
    pub fn calorie_ceiling(&self, user_id: UserId) -> Option<f64> {
        self.catalog
            .get_user(user_id)?
            .calories_per_day
            .map(|budget| budget / self.config.meals_per_day as f64)
    }

    /// Main entry point: score, filter and trim in one call
    #[instrument(skip(self, request), fields(user_id = ?request.user_id, strategy = %request.strategy))]
    pub fn recommend(&self, request: &RecommendationRequest) -> Result<Outcome<Vec<Recommendation>>> {
        let start_time = Instant::now();

        // Reject a bad override before doing any work
        validate_ceiling(request.calorie_ceiling)?;

        let context = match self.build_context(request)? {
            Some(context) => context,
            None => return Ok(Outcome::UserNotFound),
        };

        let candidates = match self.score(request, &context)? {
            Outcome::Ranked(candidates) => candidates,
            Outcome::UserNotFound => return Ok(Outcome::UserNotFound),
            Outcome::NoSignal => return Ok(Outcome::NoSignal),
        };
        debug!("{} scored {} candidates", request.strategy, candidates.len());

        let candidates = self.apply_exclusions(candidates, request, &context)?;

        let recommendations = self
            .nutrition
            .apply_for(candidates, &context, request.top_n, request.policy)?;

        info!(
            "Served {} {} recommendations in {:.2?}",
            recommendations.len(),
            request.strategy,
            start_time.elapsed()
        );
        Ok(Outcome::Ranked(recommendations))
    }

    /// Per-request context; `None` when the user is not in the catalog.
    ///
    /// A new user asking for popular recipes under an explicit ceiling is
    /// served as an anonymous request.
    fn build_context(&self, request: &RecommendationRequest) -> Result<Option<UserContext>> {
        let mut context = match request.user_id {
            Some(user_id) if self.catalog.get_user(user_id).is_none() => {
                if request.strategy == ScorerKind::Popularity && request.calorie_ceiling.is_some() {
                    debug!("User {} not in catalog, serving popularity anonymously", user_id);
                    UserContext::new(user_id)
                } else {
                    debug!("User {} not in catalog", user_id);
                    return Ok(None);
                }
            }
            Some(user_id) => build_user_context(&self.catalog, user_id, self.config.meals_per_day)?,
            None => UserContext::default(),
        };

        if request.calorie_ceiling.is_some() {
            context.calorie_ceiling = request.calorie_ceiling;
        }
        Ok(Some(context))
    }

    fn score(
        &self,
        request: &RecommendationRequest,
        context: &UserContext,
    ) -> Result<Outcome<Vec<RankedCandidate>>> {
        match request.strategy {
            ScorerKind::Hybrid => {
                let sources = request
                    .hybrid_sources
                    .as_deref()
                    .unwrap_or(&self.config.hybrid_sources);
                self.score_hybrid(sources, request, context)
            }
            kind => self.score_single(kind, request, context),
        }
    }

    fn score_single(
        &self,
        kind: ScorerKind,
        request: &RecommendationRequest,
        context: &UserContext,
    ) -> Result<Outcome<Vec<RankedCandidate>>> {
        if kind == ScorerKind::Popularity {
            return Ok(Outcome::Ranked(self.popularity.rank().to_vec()));
        }

        if request.user_id.is_none() {
            return Err(EngineError::InvalidRequest(format!(
                "{} recommendations need a user id",
                kind
            )));
        }

        match kind {
            ScorerKind::Content => Ok(self.content.recommend(context.user_id)),
            ScorerKind::Collaborative => Ok(self.collaborative.recommend(context.user_id)),
            ScorerKind::Popularity | ScorerKind::Hybrid => Err(EngineError::InvalidRequest(format!(
                "{} is not a single scorer",
                kind
            ))),
        }
    }

    /// Every source must produce a ranking; the first marker is returned as-is
    fn score_hybrid(
        &self,
        sources: &[ScorerKind],
        request: &RecommendationRequest,
        context: &UserContext,
    ) -> Result<Outcome<Vec<RankedCandidate>>> {
        if sources.is_empty() || sources.contains(&ScorerKind::Hybrid) {
            return Err(EngineError::InvalidRequest(format!(
                "hybrid sources must be plain scorers, got {:?}",
                sources
            )));
        }

        let mut outputs = Vec::with_capacity(sources.len());
        for &kind in sources {
            match self.score_single(kind, request, context)? {
                Outcome::Ranked(candidates) => outputs.push(candidates),
                marker => {
                    debug!("Hybrid source {} returned {:?}", kind, marker);
                    return Ok(marker);
                }
            }
        }

        // Trimming to top_n happens after nutrition filtering
        Ok(Outcome::Ranked(HybridCombiner.combine(&outputs, usize::MAX)))
    }

    fn apply_exclusions(
        &self,
        candidates: Vec<RankedCandidate>,
        request: &RecommendationRequest,
        context: &UserContext,
    ) -> Result<Vec<RankedCandidate>> {
        let mut pipeline = FilterPipeline::new();
        if !request.exclude.is_empty() {
            pipeline = pipeline.add_filter(ExcludeRecipesFilter::new(request.exclude.iter().copied()));
        }
        if request.exclude_rated {
            pipeline = pipeline.add_filter(AlreadyRatedFilter);
        }
        if pipeline.is_empty() {
            return Ok(candidates);
        }
        Ok(pipeline.apply(candidates, context)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use data_loader::{Interaction, Recipe, User};
    use pipeline::NutritionError;

    // ============================================================================
    // Test Fixtures
    // ============================================================================

    fn recipe(id: u32, name: &str, calories: f64, labels: &str, ingredients: &str) -> Recipe {
        Recipe {
            id,
            name: name.to_string(),
            ingredients: ingredients.to_string(),
            cook_method: "bake".to_string(),
            diet_labels: labels.split_whitespace().map(|s| s.to_string()).collect(),
            calories,
        }
    }

    /// A/B/C catalog: user 1 has a 900 calorie budget, user 2 has no history,
    /// user 3 rated only B
    fn build_test_engine() -> RecommendationEngine {
        let recipes = vec![
            recipe(1, "A", 200.0, "balanced", "oats banana"),
            recipe(2, "B", 400.0, "highprotein", "steak butter"),
            recipe(3, "C", 150.0, "balanced lowfat", "spinach banana"),
        ];
        let users = vec![
            User { id: 1, calories_per_day: Some(900.0) },
            User { id: 2, calories_per_day: None },
            User { id: 3, calories_per_day: Some(1200.0) },
        ];
        let interactions = vec![
            Interaction { user_id: 1, recipe_id: 1, rating: 5.0 },
            Interaction { user_id: 1, recipe_id: 2, rating: 2.0 },
            Interaction { user_id: 1, recipe_id: 3, rating: 4.0 },
            Interaction { user_id: 3, recipe_id: 2, rating: 5.0 },
        ];
        let catalog = Catalog::from_parts(recipes, users, interactions).unwrap();
        RecommendationEngine::new(Arc::new(catalog), EngineConfig::default()).unwrap()
    }

    fn names(recs: &[Recommendation]) -> Vec<&str> {
        recs.iter().map(|r| r.name.as_str()).collect()
    }

    // ============================================================================
    // Tests
    // ============================================================================

    #[test]
    fn test_calorie_ceiling_from_budget() {
        let engine = build_test_engine();
        assert_eq!(engine.calorie_ceiling(1), Some(300.0));
        assert_eq!(engine.calorie_ceiling(2), None);
        assert_eq!(engine.calorie_ceiling(99), None);
    }

    #[test]
    fn test_popularity_quota_for_user() {
        let engine = build_test_engine();
        let request = RecommendationRequest::new(ScorerKind::Popularity, 10)
            .for_user(1)
            .with_policy(NutritionPolicy::quota());

        let recs = engine.recommend(&request).unwrap().ranked().unwrap();
        assert_eq!(names(&recs), vec!["A", "C"]);
    }

    #[test]
    fn test_popularity_without_user_uses_override() {
        let engine = build_test_engine();
        let request = RecommendationRequest::new(ScorerKind::Popularity, 10).with_calorie_ceiling(180.0);

        let recs = engine.recommend(&request).unwrap().ranked().unwrap();
        assert_eq!(names(&recs), vec!["C"]);
    }

    #[test]
    fn test_new_user_gets_popularity_under_explicit_ceiling() {
        let engine = build_test_engine();
        let request = RecommendationRequest::new(ScorerKind::Popularity, 10)
            .for_user(999)
            .with_calorie_ceiling(300.0)
            .with_policy(NutritionPolicy::quota());

        let recs = engine.recommend(&request).unwrap().ranked().unwrap();
        assert_eq!(names(&recs), vec!["A", "C"]);

        // Without a ceiling, or for any personalized strategy, the user is still unknown
        let no_ceiling = RecommendationRequest::new(ScorerKind::Popularity, 10).for_user(999);
        assert_eq!(engine.recommend(&no_ceiling).unwrap(), Outcome::UserNotFound);
        for strategy in [ScorerKind::Content, ScorerKind::Collaborative, ScorerKind::Hybrid] {
            let request = RecommendationRequest::new(strategy, 10)
                .for_user(999)
                .with_calorie_ceiling(300.0);
            assert_eq!(engine.recommend(&request).unwrap(), Outcome::UserNotFound);
        }
    }

    #[test]
    fn test_content_drops_over_ceiling() {
        let engine = build_test_engine();
        let request = RecommendationRequest::new(ScorerKind::Content, 10).for_user(1);

        let recs = engine.recommend(&request).unwrap().ranked().unwrap();
        assert_eq!(recs.len(), 2);
        assert!(recs.iter().all(|r| r.calories <= 300.0));
        assert!(recs.iter().all(|r| r.provenance == ScorerKind::Content));
    }

    #[test]
    fn test_markers_pass_through() {
        let engine = build_test_engine();

        let unknown = RecommendationRequest::new(ScorerKind::Content, 5).for_user(77);
        assert_eq!(engine.recommend(&unknown).unwrap(), Outcome::UserNotFound);

        let no_history = RecommendationRequest::new(ScorerKind::Collaborative, 5).for_user(2);
        assert_eq!(engine.recommend(&no_history).unwrap(), Outcome::NoSignal);

        let hybrid = RecommendationRequest::new(ScorerKind::Hybrid, 5).for_user(2);
        assert_eq!(engine.recommend(&hybrid).unwrap(), Outcome::NoSignal);
    }

    #[test]
    fn test_invalid_ceiling_rejected_before_scoring() {
        let engine = build_test_engine();
        let request = RecommendationRequest::new(ScorerKind::Content, 5)
            .for_user(77)
            .with_calorie_ceiling(-5.0);

        let err = engine.recommend(&request).unwrap_err();
        assert!(matches!(
            err,
            EngineError::Nutrition(NutritionError::InvalidCalorieCeiling(_))
        ));
    }

    #[test]
    fn test_personalized_strategy_needs_user() {
        let engine = build_test_engine();
        let request = RecommendationRequest::new(ScorerKind::Collaborative, 5);
        assert!(matches!(
            engine.recommend(&request),
            Err(EngineError::InvalidRequest(_))
        ));

        let nested = RecommendationRequest::new(ScorerKind::Hybrid, 5)
            .for_user(1)
            .with_hybrid_sources(vec![ScorerKind::Hybrid]);
        assert!(matches!(
            engine.recommend(&nested),
            Err(EngineError::InvalidRequest(_))
        ));
    }

    #[test]
    fn test_hybrid_is_intersection() {
        let engine = build_test_engine();
        let request = RecommendationRequest::new(ScorerKind::Hybrid, 10).for_user(1);

        let recs = engine.recommend(&request).unwrap().ranked().unwrap();
        let mut ids: Vec<u32> = recs.iter().map(|r| r.recipe_id).collect();
        ids.sort_unstable();
        // All three are in both lists; B is over the 300 calorie ceiling
        assert_eq!(ids, vec![1, 3]);
        assert!(recs.iter().all(|r| r.provenance == ScorerKind::Hybrid));
    }

    #[test]
    fn test_exclusions() {
        let engine = build_test_engine();

        let request = RecommendationRequest::new(ScorerKind::Popularity, 10)
            .for_user(1)
            .excluding([1]);
        let recs = engine.recommend(&request).unwrap().ranked().unwrap();
        assert_eq!(names(&recs), vec!["C"]);

        let rated = RecommendationRequest::new(ScorerKind::Content, 10)
            .for_user(3)
            .exclude_rated(true);
        let recs = engine.recommend(&rated).unwrap().ranked().unwrap();
        assert!(recs.iter().all(|r| r.recipe_id != 2));
    }

    #[test]
    fn test_direct_operations() {
        let engine = build_test_engine();

        let popular: Vec<u32> = engine.rank_popular().iter().map(|c| c.recipe_id).collect();
        // A and B tie on 5.0, C has 4.0
        assert_eq!(popular, vec![1, 2, 3]);

        let content = engine.recommend_content(1).ranked().unwrap();
        let combined = engine.combine(&[content.clone(), content.clone()], 2);
        assert_eq!(combined.len(), 2);
        assert_eq!(combined[0].recipe_id, content[0].recipe_id);

        let recs = engine
            .apply_nutrition(content, Some(300.0), 1, NutritionPolicy::Simple)
            .unwrap();
        assert_eq!(recs.len(), 1);

        assert!(engine.invalidate_profile(1));
        assert!(!engine.invalidate_profile(1));
    }
}
