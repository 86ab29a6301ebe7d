use tracing::debug;

use crate::field_error::FieldErrors;
use crate::resources::StackResource;
use crate::schema::FieldSchema;
use crate::settings::KindSettings;
use crate::version;

/// Read-only data the checks of a resource kind run against.
pub struct CheckContext<'a> {
    pub settings: &'a KindSettings,
    pub schema: &'a FieldSchema,
}

pub type CreateCheckFn<K> = fn(&CheckContext<'_>, &K) -> FieldErrors;
pub type UpdateCheckFn<K> = fn(&CheckContext<'_>, &K, &K) -> FieldErrors;

/// A named check, tagged with the stage it runs in.
pub enum Check<K> {
    /// Runs against the new object on both create and update
    Create {
        name: &'static str,
        run: CreateCheckFn<K>,
    },
    /// Runs against (old, new) on update only, before the create checks
    Update {
        name: &'static str,
        run: UpdateCheckFn<K>,
    },
}

impl<K> Check<K> {
    pub fn create(name: &'static str, run: CreateCheckFn<K>) -> Self {
        Check::Create { name, run }
    }

    pub fn update(name: &'static str, run: UpdateCheckFn<K>) -> Self {
        Check::Update { name, run }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Check::Create { name, .. } | Check::Update { name, .. } => *name,
        }
    }
}

/// Warnings and errors collected by the pipeline. The resource is admitted
/// when no error has been collected; warnings are returned in both cases.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ValidationOutcome {
    pub warnings: Vec<String>,
    pub errors: FieldErrors,
}

impl ValidationOutcome {
    pub fn is_admitted(&self) -> bool {
        self.errors.is_empty()
    }
}

/// Ordered checks of a resource kind.
///
/// The version deprecation check always runs first. On update, the update
/// checks run next and any error collected so far ends the evaluation: the
/// create checks are skipped so that an overridable violation (a downgrade)
/// is not buried under unrelated errors. Otherwise every create check runs,
/// to report all the defects at once.
pub struct CheckPipeline<K> {
    checks: Vec<Check<K>>,
}

impl<K: StackResource> CheckPipeline<K> {
    pub fn new(checks: Vec<Check<K>>) -> Self {
        CheckPipeline { checks }
    }

    pub fn run(&self, ctx: &CheckContext<'_>, old: Option<&K>, new: &K) -> ValidationOutcome {
        let mut outcome = ValidationOutcome::default();

        let (warning, errors) =
            version::check_deprecated_version(new.version(), &ctx.settings.versions);
        outcome.warnings.extend(warning);
        outcome.errors.extend(errors);

        if let Some(old) = old {
            for check in &self.checks {
                if let Check::Update { name, run } = check {
                    let errors = run(ctx, old, new);
                    debug!(check = name, errors = errors.len(), "update check");
                    outcome.errors.extend(errors);
                }
            }

            if !outcome.errors.is_empty() {
                debug!(
                    errors = outcome.errors.len(),
                    "update rejected, skipping the remaining checks"
                );
                return outcome;
            }
        }

        for check in &self.checks {
            if let Check::Create { name, run } = check {
                let errors = run(ctx, new);
                debug!(check = name, errors = errors.len(), "create check");
                outcome.errors.extend(errors);
            }
        }

        outcome
    }
}
