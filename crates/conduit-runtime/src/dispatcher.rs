use std::sync::Arc;
use std::time::Duration;

use conduit_adapters::{AdapterRegistry, CredentialCodec, ProviderAdapter, ProviderCredentials};
use conduit_audit::{AuditRecord, AuditStore, CallOutcome};
use conduit_core::{CallRequest, CallResult, ConnectorInstance, InstanceStore};
use tokio::time::Instant;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::error::DispatchError;
use crate::health::HealthReport;
use crate::retry::{RetryDecision, RetryPolicy};

/// A dispatch that ran: the final result, plus a warning when its audit
/// record could not be stored.
#[derive(Debug, Clone)]
pub struct Dispatched {
    pub result: CallResult,
    pub audit_warning: Option<String>,
}

/// A dispatch rejected before any adapter ran.
#[derive(Debug)]
pub struct Rejected {
    pub error: DispatchError,
    pub audit_warning: Option<String>,
}

/// Runs one tenant call end to end.
///
/// Resolves the instance for the calling organization, runs its provider
/// adapter under the retry policy and the caller's deadline, and appends
/// exactly one audit record whatever the outcome.
pub struct Dispatcher {
    instances: Arc<dyn InstanceStore>,
    audit: Arc<dyn AuditStore>,
    registry: AdapterRegistry,
    codec: Arc<dyn CredentialCodec>,
    retry: RetryPolicy,
    default_timeout: Option<Duration>,
}

impl Dispatcher {
    pub fn new(
        instances: Arc<dyn InstanceStore>,
        audit: Arc<dyn AuditStore>,
        registry: AdapterRegistry,
        codec: Arc<dyn CredentialCodec>,
    ) -> Self {
        Self {
            instances,
            audit,
            registry,
            codec,
            retry: RetryPolicy::default(),
            default_timeout: None,
        }
    }

    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Deadline for calls that do not carry their own `timeoutMs`.
    pub fn with_default_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.default_timeout = timeout;
        self
    }

    pub fn registry(&self) -> &AdapterRegistry {
        &self.registry
    }

    pub fn health(&self) -> HealthReport {
        HealthReport::healthy(self.registry.providers())
    }

    /// Execute `request` against `instance_id` on behalf of `organization_id`.
    ///
    /// `organization_id` must come from verified identity.
    pub async fn execute(
        &self,
        organization_id: Uuid,
        instance_id: Uuid,
        request: &CallRequest,
    ) -> Result<Dispatched, Rejected> {
        let (instance, adapter) = match self.resolve(organization_id, instance_id).await {
            Ok(resolved) => resolved,
            Err(error) => return Err(self.reject(organization_id, instance_id, request, error).await),
        };

        let started = Instant::now();
        let timeout = request.timeout().or(self.default_timeout);

        let (result, outcome, attempts) = match self.credentials(&instance) {
            Err(fault) => (fault, CallOutcome::Fault, 0),
            Ok(credentials) => {
                let mut attempts = 0;
                let run = self.attempt(&instance, adapter.as_ref(), &credentials, request, &mut attempts);
                let finished = match timeout {
                    Some(limit) => tokio::time::timeout(limit, run).await.map_err(|_| limit),
                    None => Ok(run.await),
                };
                match finished {
                    Ok((result, outcome)) => (result, outcome, attempts),
                    Err(limit) => {
                        warn!(
                            instance_id = %instance.id,
                            attempts,
                            timeout_ms = limit.as_millis() as u64,
                            "Dispatch deadline exceeded"
                        );
                        (
                            CallResult::timed_out(limit, started.elapsed()),
                            CallOutcome::TimedOut,
                            attempts,
                        )
                    }
                }
            }
        };

        info!(
            instance_id = %instance.id,
            provider = %instance.provider_id,
            status = result.status_code,
            attempts,
            outcome = %outcome,
            "Dispatch finished"
        );

        let record = AuditRecord::for_result(
            organization_id,
            instance.id,
            request,
            &result,
            outcome,
            attempts,
        );
        let audit_warning = self.append(record).await;

        Ok(Dispatched {
            result,
            audit_warning,
        })
    }

    async fn resolve(
        &self,
        organization_id: Uuid,
        instance_id: Uuid,
    ) -> Result<(ConnectorInstance, Arc<dyn ProviderAdapter>), DispatchError> {
        let instance = self
            .instances
            .get(instance_id, organization_id)
            .await?
            .ok_or(DispatchError::NotFound(instance_id))?;

        if !instance.is_active {
            return Err(DispatchError::InstanceInactive(instance_id));
        }

        let adapter = self
            .registry
            .resolve(&instance.provider_id)
            .ok_or_else(|| DispatchError::UnknownProvider(instance.provider_id.clone()))?;

        Ok((instance, adapter))
    }

    /// Open the instance's credentials once, ahead of every attempt.
    fn credentials(&self, instance: &ConnectorInstance) -> Result<ProviderCredentials, CallResult> {
        self.codec.decode(instance).map_err(|e| {
            warn!(
                instance_id = %instance.id,
                provider = %instance.provider_id,
                error = %e,
                "Stored credentials could not be opened"
            );
            CallResult::fault(format!("Invalid {} configuration", instance.provider_id))
        })
    }

    /// The attempt loop. `attempts` is kept current so it survives
    /// cancellation by the deadline.
    async fn attempt(
        &self,
        instance: &ConnectorInstance,
        adapter: &dyn ProviderAdapter,
        credentials: &ProviderCredentials,
        request: &CallRequest,
        attempts: &mut u32,
    ) -> (CallResult, CallOutcome) {
        let mut attempt = 1;
        loop {
            *attempts = attempt;

            let result = match adapter.execute(instance, credentials, request).await {
                Ok(result) => result,
                Err(e) => {
                    error!(
                        instance_id = %instance.id,
                        provider = %instance.provider_id,
                        attempt,
                        error = %e,
                        "Adapter fault"
                    );
                    return (CallResult::fault(e.to_string()), CallOutcome::Fault);
                }
            };

            match self.retry.decide(&result, attempt) {
                RetryDecision::Stop => return (result, CallOutcome::Completed),
                RetryDecision::Retry(delay) => {
                    warn!(
                        instance_id = %instance.id,
                        provider = %instance.provider_id,
                        attempt,
                        status = result.status_code,
                        delay_ms = delay.as_millis() as u64,
                        "Transient upstream failure, retrying"
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
            }
        }
    }

    async fn reject(
        &self,
        organization_id: Uuid,
        instance_id: Uuid,
        request: &CallRequest,
        error: DispatchError,
    ) -> Rejected {
        warn!(
            organization_id = %organization_id,
            instance_id = %instance_id,
            status = error.status_code(),
            error = %error,
            "Dispatch rejected"
        );

        let record = AuditRecord::rejected(
            organization_id,
            instance_id,
            request,
            error.status_code(),
            error.to_string(),
        );
        let audit_warning = self.append(record).await;

        Rejected {
            error,
            audit_warning,
        }
    }

    async fn append(&self, record: AuditRecord) -> Option<String> {
        let record_id = record.id;
        match self.audit.append(record).await {
            Ok(()) => None,
            Err(e) => {
                error!(record_id = %record_id, error = %e, "Failed to append audit record");
                Some(format!("audit record not persisted: {}", e))
            }
        }
    }
}
