//! The validation pipeline that gates every template write.
//!
//! A pipeline is an ordered list of [`TemplateRule`]s. Rules run in order and
//! evaluation stops at the first failure, so later rules may rely on the
//! invariants established by earlier ones (the name is checked before any
//! parsing work happens on the conditions or markup).

use std::sync::Arc;

use async_trait::async_trait;

use crate::error::{CoreError, ValidationFailure};
use crate::message_template::{
    TemplateCandidate, FIELD_CONDITIONS, FIELD_MESSAGE_MARKUP, FIELD_NAME, NAME_MAX_LENGTH,
};
use crate::repository::TemplateRepository;

// ---------------------------------------------------------------------------
// Messages
// ---------------------------------------------------------------------------

pub const NAME_TOO_LONG_MESSAGE: &str = "The maximum length for message template name is 255.";
pub const NAME_REQUIRED_MESSAGE: &str = "Message template name field is required.";
pub const NAME_TAKEN_MESSAGE: &str = "Message template name is already in use.";

// ---------------------------------------------------------------------------
// Capabilities
// ---------------------------------------------------------------------------

/// A pass/fail check over a piece of text written in some template language.
///
/// Implementations own their grammar; callers only see the verdict and, on
/// failure, a human-readable message.
pub trait TextValidator: Send + Sync {
    fn validate(&self, text: &str) -> Result<(), String>;
}

/// Outcome of one rule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    Pass,
    Fail(String),
}

/// One step of the pipeline.
#[async_trait]
pub trait TemplateRule: Send + Sync {
    /// The field reported when this rule rejects a candidate.
    fn field(&self) -> &'static str;

    /// Judge the candidate. `Err` is reserved for storage failures while
    /// looking something up, never for a rejected candidate.
    async fn check(&self, candidate: &TemplateCandidate) -> Result<Verdict, CoreError>;
}

// ---------------------------------------------------------------------------
// Rules
// ---------------------------------------------------------------------------

/// Name length must not exceed [`NAME_MAX_LENGTH`] bytes of UTF-8.
pub struct NameLengthRule;

#[async_trait]
impl TemplateRule for NameLengthRule {
    fn field(&self) -> &'static str {
        FIELD_NAME
    }

    async fn check(&self, candidate: &TemplateCandidate) -> Result<Verdict, CoreError> {
        if candidate.name.len() > NAME_MAX_LENGTH {
            return Ok(Verdict::Fail(NAME_TOO_LONG_MESSAGE.to_string()));
        }
        Ok(Verdict::Pass)
    }
}

/// Name must contain something other than whitespace.
pub struct NameRequiredRule;

#[async_trait]
impl TemplateRule for NameRequiredRule {
    fn field(&self) -> &'static str {
        FIELD_NAME
    }

    async fn check(&self, candidate: &TemplateCandidate) -> Result<Verdict, CoreError> {
        if candidate.name.trim().is_empty() {
            return Ok(Verdict::Fail(NAME_REQUIRED_MESSAGE.to_string()));
        }
        Ok(Verdict::Pass)
    }
}

/// Name must not be used by any other current template.
pub struct UniqueNameRule {
    repository: Arc<dyn TemplateRepository>,
}

impl UniqueNameRule {
    pub fn new(repository: Arc<dyn TemplateRepository>) -> Self {
        Self { repository }
    }
}

#[async_trait]
impl TemplateRule for UniqueNameRule {
    fn field(&self) -> &'static str {
        FIELD_NAME
    }

    async fn check(&self, candidate: &TemplateCandidate) -> Result<Verdict, CoreError> {
        if self
            .repository
            .name_in_use(&candidate.name, candidate.id)
            .await?
        {
            return Ok(Verdict::Fail(NAME_TAKEN_MESSAGE.to_string()));
        }
        Ok(Verdict::Pass)
    }
}

/// Conditions must satisfy the configured conditions validator.
pub struct ConditionsRule {
    validator: Arc<dyn TextValidator>,
}

impl ConditionsRule {
    pub fn new(validator: Arc<dyn TextValidator>) -> Self {
        Self { validator }
    }
}

#[async_trait]
impl TemplateRule for ConditionsRule {
    fn field(&self) -> &'static str {
        FIELD_CONDITIONS
    }

    async fn check(&self, candidate: &TemplateCandidate) -> Result<Verdict, CoreError> {
        Ok(match self.validator.validate(&candidate.conditions) {
            Ok(()) => Verdict::Pass,
            Err(message) => Verdict::Fail(message),
        })
    }
}

/// Markup must satisfy the configured markup validator. Failure messages are
/// reported as a sentence.
pub struct MarkupRule {
    validator: Arc<dyn TextValidator>,
}

impl MarkupRule {
    pub fn new(validator: Arc<dyn TextValidator>) -> Self {
        Self { validator }
    }
}

#[async_trait]
impl TemplateRule for MarkupRule {
    fn field(&self) -> &'static str {
        FIELD_MESSAGE_MARKUP
    }

    async fn check(&self, candidate: &TemplateCandidate) -> Result<Verdict, CoreError> {
        Ok(match self.validator.validate(&candidate.message_markup) {
            Ok(()) => Verdict::Pass,
            Err(message) if message.ends_with('.') => Verdict::Fail(message),
            Err(message) => Verdict::Fail(format!("{message}.")),
        })
    }
}

// ---------------------------------------------------------------------------
// Pipeline
// ---------------------------------------------------------------------------

/// An ordered, short-circuiting chain of rules.
#[derive(Clone, Default)]
pub struct ValidationPipeline {
    rules: Vec<Arc<dyn TemplateRule>>,
}

impl ValidationPipeline {
    /// An empty pipeline; every candidate passes.
    pub fn new() -> Self {
        Self::default()
    }

    /// The five message template rules in their fixed order: name length,
    /// name presence, name uniqueness, conditions, markup.
    pub fn standard(
        repository: Arc<dyn TemplateRepository>,
        conditions: Arc<dyn TextValidator>,
        markup: Arc<dyn TextValidator>,
    ) -> Self {
        Self::new()
            .with_rule(NameLengthRule)
            .with_rule(NameRequiredRule)
            .with_rule(UniqueNameRule::new(repository))
            .with_rule(ConditionsRule::new(conditions))
            .with_rule(MarkupRule::new(markup))
    }

    /// Append a rule after all existing ones.
    pub fn with_rule(mut self, rule: impl TemplateRule + 'static) -> Self {
        self.rules.push(Arc::new(rule));
        self
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Run the rules in order, returning the first failure (if any).
    pub async fn first_failure(
        &self,
        candidate: &TemplateCandidate,
    ) -> Result<Option<ValidationFailure>, CoreError> {
        for rule in &self.rules {
            if let Verdict::Fail(message) = rule.check(candidate).await? {
                return Ok(Some(ValidationFailure::new(rule.field(), message)));
            }
        }
        Ok(None)
    }

    /// Like [`Self::first_failure`], but a failure becomes `CoreError::Validation`.
    pub async fn ensure_valid(&self, candidate: &TemplateCandidate) -> Result<(), CoreError> {
        match self.first_failure(candidate).await? {
            Some(failure) => Err(failure.into()),
            None => Ok(()),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;
    use crate::conditions::ConditionExpressionValidator;
    use crate::markup::MessageMarkupValidator;
    use crate::memory::InMemoryStorage;
    use crate::message_template::CreateMessageTemplate;
    use crate::outgoing_intent::CreateOutgoingIntent;
    use crate::repository::OutgoingIntentRepository;

    fn candidate(name: &str, conditions: &str, markup: &str) -> TemplateCandidate {
        TemplateCandidate {
            id: None,
            outgoing_intent_id: 1,
            name: name.to_string(),
            conditions: conditions.to_string(),
            message_markup: markup.to_string(),
        }
    }

    fn pipeline(storage: Arc<InMemoryStorage>) -> ValidationPipeline {
        ValidationPipeline::standard(
            storage,
            Arc::new(ConditionExpressionValidator),
            Arc::new(MessageMarkupValidator),
        )
    }

    /// Storage holding one template named "Taken" under intent 1.
    async fn storage_with_taken_name() -> Arc<InMemoryStorage> {
        let storage = Arc::new(InMemoryStorage::new());
        let intent = storage
            .create_intent(&CreateOutgoingIntent {
                name: "intent.core.welcome".into(),
            })
            .await
            .unwrap();
        let input = CreateMessageTemplate {
            name: "Taken".into(),
            conditions: None,
            message_markup: "<p>Hi</p>".into(),
        };
        storage
            .insert_with_snapshot(&TemplateCandidate::new(intent.id, &input))
            .await
            .unwrap();
        storage
    }

    struct CountingRule(Arc<AtomicUsize>);

    #[async_trait]
    impl TemplateRule for CountingRule {
        fn field(&self) -> &'static str {
            "counter"
        }

        async fn check(&self, _candidate: &TemplateCandidate) -> Result<Verdict, CoreError> {
            self.0.fetch_add(1, Ordering::SeqCst);
            Ok(Verdict::Pass)
        }
    }

    #[tokio::test]
    async fn valid_candidate_passes() {
        let p = pipeline(Arc::new(InMemoryStorage::new()));
        let result = p
            .first_failure(&candidate("Greeting", "always", "<p>Hi {{name}}</p>"))
            .await
            .unwrap();
        assert_eq!(result, None);
    }

    #[tokio::test]
    async fn standard_pipeline_has_five_rules() {
        assert_eq!(pipeline(Arc::new(InMemoryStorage::new())).len(), 5);
        assert!(ValidationPipeline::new().is_empty());
    }

    #[tokio::test]
    async fn overlong_name_reported_before_uniqueness() {
        let storage = Arc::new(InMemoryStorage::new());
        let long = "n".repeat(256);
        let intent = storage
            .create_intent(&CreateOutgoingIntent {
                name: "intent".into(),
            })
            .await
            .unwrap();
        // Force the long name into the store so it is also a duplicate.
        let mut c = candidate(&long, "", "<p/>");
        c.outgoing_intent_id = intent.id;
        storage.insert_with_snapshot(&c).await.unwrap();

        let failure = pipeline(storage)
            .first_failure(&candidate(&long, "", "<p/>"))
            .await
            .unwrap()
            .expect("should fail");
        assert_eq!(failure.field, "name");
        assert_eq!(failure.message, NAME_TOO_LONG_MESSAGE);
    }

    #[tokio::test]
    async fn name_of_exactly_max_length_is_accepted() {
        let p = pipeline(Arc::new(InMemoryStorage::new()));
        let name = "a".repeat(NAME_MAX_LENGTH);
        assert_eq!(
            p.first_failure(&candidate(&name, "", "<p/>")).await.unwrap(),
            None
        );
    }

    #[tokio::test]
    async fn name_length_counts_bytes() {
        let p = pipeline(Arc::new(InMemoryStorage::new()));
        // 200 characters, 400 bytes.
        let name = "é".repeat(200);
        let failure = p
            .first_failure(&candidate(&name, "", "<p/>"))
            .await
            .unwrap()
            .expect("should fail");
        assert_eq!(failure, ValidationFailure::new("name", NAME_TOO_LONG_MESSAGE));
    }

    #[tokio::test]
    async fn empty_name_is_required() {
        let p = pipeline(Arc::new(InMemoryStorage::new()));
        let failure = p
            .first_failure(&candidate("   ", "not valid (", "nope"))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(failure, ValidationFailure::new("name", NAME_REQUIRED_MESSAGE));
    }

    #[tokio::test]
    async fn duplicate_name_rejected_but_own_id_excluded() {
        let storage = storage_with_taken_name().await;
        let existing_id = storage.find_template(1).await.unwrap().unwrap().id;
        let p = pipeline(storage);

        let failure = p
            .first_failure(&candidate("Taken", "", "<p/>"))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(failure, ValidationFailure::new("name", NAME_TAKEN_MESSAGE));

        let mut own = candidate("Taken", "", "<p/>");
        own.id = Some(existing_id);
        assert_eq!(p.first_failure(&own).await.unwrap(), None);
    }

    #[tokio::test]
    async fn bad_conditions_reported_before_bad_markup() {
        let p = pipeline(Arc::new(InMemoryStorage::new()));
        let failure = p
            .first_failure(&candidate("Greeting", "user.age >=", "not xml"))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(failure.field, "conditions");
    }

    #[tokio::test]
    async fn markup_failure_message_ends_with_period() {
        let p = pipeline(Arc::new(InMemoryStorage::new()));
        let failure = p
            .first_failure(&candidate("Greeting", "always", "<p>unclosed"))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(failure.field, "message_markup");
        assert!(failure.message.ends_with('.'));
        assert!(!failure.message.ends_with(".."));
    }

    #[tokio::test]
    async fn stops_at_first_failure() {
        let counter = Arc::new(AtomicUsize::new(0));
        let p = ValidationPipeline::new()
            .with_rule(NameRequiredRule)
            .with_rule(CountingRule(Arc::clone(&counter)));

        assert!(p
            .first_failure(&candidate("", "", ""))
            .await
            .unwrap()
            .is_some());
        assert_eq!(counter.load(Ordering::SeqCst), 0);

        assert!(p
            .first_failure(&candidate("ok", "", ""))
            .await
            .unwrap()
            .is_none());
        assert_eq!(counter.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn ensure_valid_maps_failure_to_core_error() {
        let p = ValidationPipeline::new().with_rule(NameRequiredRule);
        let err = p.ensure_valid(&candidate("", "", "")).await.unwrap_err();
        assert!(matches!(
            err,
            CoreError::Validation(ValidationFailure { field: "name", .. })
        ));
    }
}
