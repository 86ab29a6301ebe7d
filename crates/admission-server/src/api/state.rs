use stack_validator::ValidatorRegistry;

pub(crate) struct ApiServerState {
    pub(crate) validators: ValidatorRegistry,
}
