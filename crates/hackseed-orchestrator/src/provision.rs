//! Identity provisioning: create the account, or log in if it exists.
//!
//! Running the same plan twice converges on the same accounts: the second
//! run gets a "user exists" conflict for every identity and falls back to a
//! login with the same credentials.

use std::future::Future;
use std::time::Instant;

use hackseed_client::auth::{AuthResponse, LoginRequest, RegisterRequest};
use hackseed_client::retry::retry_transport;
use hackseed_client::{ApiError, HackathonClient, RetryPolicy};
use serde::Serialize;
use zeroize::Zeroizing;

use crate::classify::{self, ConflictKind, FailureKind};
use crate::error::{Failure, ProvisionError};
use crate::executor::{elapsed_ms, run_stage, CancelSignal, StageResult};
use crate::identity::{Identity, IdentitySpec, ProvisionState};

/// Outcome of provisioning one identity.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "status", rename_all = "camelCase")]
pub enum ProvisionOutcome {
    Provisioned(Identity),
    Failed(ProvisionError),
}

/// Per-identity result of the provisioning stage.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProvisionRecord {
    pub email: String,
    pub outcome: ProvisionOutcome,
    /// Time spent on this identity, retries and login fallback included.
    pub elapsed_ms: u64,
}

impl ProvisionRecord {
    pub fn identity(&self) -> Option<&Identity> {
        match &self.outcome {
            ProvisionOutcome::Provisioned(identity) => Some(identity),
            ProvisionOutcome::Failed(_) => None,
        }
    }

    pub fn failure(&self) -> Option<&Failure> {
        match &self.outcome {
            ProvisionOutcome::Provisioned(_) => None,
            ProvisionOutcome::Failed(e) => Some(e.failure()),
        }
    }
}

/// Ensures accounts exist and are authenticated.
#[derive(Debug, Clone)]
pub struct Provisioner {
    client: HackathonClient,
    retry: RetryPolicy,
}

impl Provisioner {
    pub fn new(client: HackathonClient) -> Self {
        Self {
            client,
            retry: RetryPolicy::default(),
        }
    }

    /// Retry policy for transport failures of register and login calls.
    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Create the account or, if it already exists, log in.
    pub async fn ensure(&self, spec: &IdentitySpec) -> Result<Identity, ProvisionError> {
        let req = RegisterRequest {
            email: &spec.email,
            password: &spec.password,
            first_name: &spec.first_name,
            last_name: &spec.last_name,
            role: &spec.role,
        };
        let created = retry_transport(&self.retry, || self.client.auth().register(&req)).await;

        match created {
            Ok(reply) => {
                let identity = identity_from(spec, ProvisionState::New, reply).map_err(|failure| {
                    ProvisionError::CreationFailed {
                        email: spec.email.clone(),
                        failure,
                    }
                })?;
                tracing::debug!(email = %spec.email, "account created");
                Ok(identity)
            }
            Err(e) if classify::conflict_of(&e) == Some(ConflictKind::UserExists) => {
                tracing::debug!(email = %spec.email, "account exists, logging in");
                self.login_as(spec, ProvisionState::Existing)
                    .await
                    .map_err(|failure| ProvisionError::ConflictUnresolved {
                        email: spec.email.clone(),
                        failure,
                    })
            }
            Err(e) => Err(ProvisionError::CreationFailed {
                email: spec.email.clone(),
                failure: classify::failure(&e),
            }),
        }
    }

    /// Log in without ever creating the account.
    pub async fn login(&self, spec: &IdentitySpec) -> Result<Identity, ProvisionError> {
        self.login_as(spec, ProvisionState::Existing)
            .await
            .map_err(|failure| ProvisionError::CreationFailed {
                email: spec.email.clone(),
                failure,
            })
    }

    async fn login_as(&self, spec: &IdentitySpec, state: ProvisionState) -> Result<Identity, Failure> {
        let req = LoginRequest {
            email: &spec.email,
            password: &spec.password,
        };
        let reply = retry_transport(&self.retry, || self.client.auth().login(&req))
            .await
            .map_err(|e| classify::failure(&e))?;
        identity_from(spec, state, reply)
    }

    /// Log in again with the identity's credentials and store the new token.
    pub async fn refresh(&self, identity: &Identity) -> Result<Zeroizing<String>, Failure> {
        let req = LoginRequest {
            email: &identity.email,
            password: &identity.password,
        };
        let reply = retry_transport(&self.retry, || self.client.auth().login(&req))
            .await
            .map_err(|e| classify::failure(&e))?;
        let token = reply
            .access_token
            .filter(|t| !t.is_empty())
            .ok_or_else(|| Failure::validation("login reply carried no accessToken"))?;
        identity.token.set(token);
        tracing::info!(email = %identity.email, "access token refreshed");
        identity
            .token()
            .ok_or_else(|| Failure::auth("token lost after refresh"))
    }

    /// Run `call` with the identity's token. On a 401, log in once and
    /// replay the call once with the fresh token.
    ///
    /// The outer error means no usable token could be obtained; the inner
    /// result is the call's own.
    pub async fn with_reauth<T, F, Fut>(&self, identity: &Identity, mut call: F) -> Result<Result<T, ApiError>, Failure>
    where
        F: FnMut(Zeroizing<String>) -> Fut,
        Fut: Future<Output = Result<T, ApiError>>,
    {
        let token = identity
            .token()
            .ok_or_else(|| Failure::auth(format!("{} has no access token", identity.email)))?;
        match call(token).await {
            Err(e) if e.status_code == 401 => {
                tracing::warn!(email = %identity.email, endpoint = %e.endpoint, "token rejected, logging in again");
                let fresh = self.refresh(identity).await?;
                Ok(call(fresh).await)
            }
            other => Ok(other),
        }
    }

    /// Provision every spec, in input order. One identity's failure does not
    /// affect the others.
    pub async fn ensure_all(&self, specs: Vec<IdentitySpec>, limit: usize, cancel: &CancelSignal) -> StageResult<ProvisionRecord> {
        let this = self.clone();
        run_stage(specs, limit, cancel, move |_, spec| {
            let this = this.clone();
            async move {
                let started = Instant::now();
                let outcome = match this.ensure(&spec).await {
                    Ok(identity) => ProvisionOutcome::Provisioned(identity),
                    Err(e) => {
                        tracing::warn!(email = %spec.email, error = %e, "provisioning failed");
                        ProvisionOutcome::Failed(e)
                    }
                };
                ProvisionRecord {
                    email: spec.email.clone(),
                    outcome,
                    elapsed_ms: elapsed_ms(started),
                }
            }
        })
        .await
    }
}

fn identity_from(spec: &IdentitySpec, state: ProvisionState, reply: AuthResponse) -> Result<Identity, Failure> {
    let token = reply
        .access_token
        .filter(|t| !t.is_empty())
        .ok_or_else(|| Failure::new(FailureKind::Validation, "auth reply carried no accessToken"))?;
    let user_id = reply.user.and_then(|u| u.id);
    Ok(Identity::new(spec, state, user_id, token))
}
