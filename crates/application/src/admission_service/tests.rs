use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{Map, Value, json};
use tokio::sync::Mutex;
use url::Url;

use nomadgate_core::{AppError, AppResult, PolicyPath};
use nomadgate_domain::{IssuerTrust, Role};

use crate::nomad_ports::{JobCompiler, JobDispatcher};
use crate::rejection::{Rejection, RejectionStage};
use crate::token_trust_service::TokenTrustService;
use crate::trust_admin_service::TrustAdminService;
use crate::trust_ports::{
    IssuerRecord, IssuerTrustRepository, KeySet, KeySetSource, RoleRecord, RoleRepository,
    TokenVerifier, VerifiedClaims,
};

use super::{AdmissionRequest, AdmissionService};

const ISSUER: &str = "https://gitlab.example.com";
const KEY_SET_URL: &str = "https://gitlab.example.com/oauth/discovery/keys";

#[derive(Default)]
struct FakeRoleRepository {
    roles: Mutex<HashMap<String, RoleRecord>>,
    next_id: Mutex<i64>,
    unavailable: bool,
}

#[async_trait]
impl RoleRepository for FakeRoleRepository {
    async fn find_role(&self, name: &str) -> AppResult<Option<RoleRecord>> {
        if self.unavailable {
            return Err(AppError::Internal("role store unavailable".to_owned()));
        }
        Ok(self.roles.lock().await.get(name).cloned())
    }

    async fn create_role(&self, role: Role) -> AppResult<RoleRecord> {
        let mut roles = self.roles.lock().await;
        let name = role.name().as_str().to_owned();
        if roles.contains_key(&name) {
            return Err(AppError::Conflict(format!("role '{name}' already exists")));
        }

        let mut next_id = self.next_id.lock().await;
        *next_id += 1;
        let record = RoleRecord { id: *next_id, role };
        roles.insert(name, record.clone());
        Ok(record)
    }

    async fn delete_role(&self, name: &str) -> AppResult<()> {
        self.roles
            .lock()
            .await
            .remove(name)
            .map(|_| ())
            .ok_or_else(|| AppError::NotFound(format!("role '{name}' does not exist")))
    }

    async fn list_roles(&self) -> AppResult<Vec<RoleRecord>> {
        let mut roles: Vec<RoleRecord> = self.roles.lock().await.values().cloned().collect();
        roles.sort_by(|left, right| left.role.name().as_str().cmp(right.role.name().as_str()));
        Ok(roles)
    }
}

#[derive(Default)]
struct FakeIssuerRepository {
    issuers: Mutex<HashMap<String, IssuerRecord>>,
}

#[async_trait]
impl IssuerTrustRepository for FakeIssuerRepository {
    async fn find_issuer(&self, bound_issuer: &str) -> AppResult<Option<IssuerRecord>> {
        Ok(self.issuers.lock().await.get(bound_issuer).cloned())
    }

    async fn save_issuer(&self, issuer: IssuerTrust) -> AppResult<IssuerRecord> {
        let mut issuers = self.issuers.lock().await;
        let id = issuers
            .get(issuer.bound_issuer())
            .map(|record| record.id)
            .unwrap_or(issuers.len() as i64 + 1);
        let record = IssuerRecord { id, issuer };
        issuers.insert(record.issuer.bound_issuer().to_owned(), record.clone());
        Ok(record)
    }

    async fn delete_issuer(&self, bound_issuer: &str) -> AppResult<()> {
        self.issuers
            .lock()
            .await
            .remove(bound_issuer)
            .map(|_| ())
            .ok_or_else(|| AppError::NotFound(format!("issuer '{bound_issuer}' is not trusted")))
    }

    async fn list_issuers(&self) -> AppResult<Vec<IssuerRecord>> {
        Ok(self.issuers.lock().await.values().cloned().collect())
    }
}

#[derive(Default)]
struct FakeKeySetSource {
    fetched: Mutex<Vec<String>>,
    unreachable: bool,
}

#[async_trait]
impl KeySetSource for FakeKeySetSource {
    async fn key_set(&self, url: &Url) -> AppResult<KeySet> {
        self.fetched.lock().await.push(url.to_string());
        if self.unreachable {
            return Err(AppError::Internal("key set returned status 503".to_owned()));
        }
        KeySet::from_jwks(&json!({"keys": [{"kid": "key-1", "kty": "RSA"}]}))
    }
}

struct FakeToken {
    issuer: String,
    kid: Option<String>,
    claims: Value,
    signature_valid: bool,
}

#[derive(Default)]
struct FakeTokenVerifier {
    tokens: HashMap<String, FakeToken>,
}

impl FakeTokenVerifier {
    fn with_token(mut self, raw: &str, token: FakeToken) -> Self {
        self.tokens.insert(raw.to_owned(), token);
        self
    }

    fn token(&self, raw: &str) -> AppResult<&FakeToken> {
        self.tokens
            .get(raw)
            .ok_or_else(|| AppError::Validation("token is not a JWT".to_owned()))
    }
}

impl TokenVerifier for FakeTokenVerifier {
    fn unverified_issuer(&self, token: &str) -> AppResult<String> {
        Ok(self.token(token)?.issuer.clone())
    }

    fn key_id(&self, token: &str) -> AppResult<Option<String>> {
        Ok(self.token(token)?.kid.clone())
    }

    fn verify(&self, token: &str, jwk: &Value, bound_issuer: &str) -> AppResult<VerifiedClaims> {
        let token = self.token(token)?;
        if !token.signature_valid || jwk.get("kid").and_then(Value::as_str) != token.kid.as_deref()
        {
            return Err(AppError::Unauthorized("InvalidSignature".to_owned()));
        }
        if token.issuer != bound_issuer {
            return Err(AppError::Unauthorized("InvalidIssuer".to_owned()));
        }

        match &token.claims {
            Value::Object(claims) => Ok(VerifiedClaims::new(claims.clone())),
            _ => Ok(VerifiedClaims::new(Map::new())),
        }
    }
}

#[derive(Default)]
struct FakeJobCompiler {
    compiled: Mutex<Vec<String>>,
}

#[async_trait]
impl JobCompiler for FakeJobCompiler {
    async fn compile(&self, raw: &str) -> AppResult<Value> {
        self.compiled.lock().await.push(raw.to_owned());
        serde_json::from_str(raw)
            .map_err(|error| AppError::Validation(format!("input.hcl: {error}")))
    }
}

#[derive(Default)]
struct FakeJobDispatcher {
    dispatched: Mutex<Vec<Value>>,
    rejecting: bool,
}

#[async_trait]
impl JobDispatcher for FakeJobDispatcher {
    async fn dispatch(&self, descriptor: &Value) -> AppResult<Value> {
        if self.rejecting {
            return Err(AppError::Internal("permission denied".to_owned()));
        }
        self.dispatched.lock().await.push(descriptor.clone());
        Ok(json!({"EvalID": "eval-1", "JobModifyIndex": 7}))
    }
}

struct Harness {
    admin: TrustAdminService,
    admission: AdmissionService,
    key_sets: Arc<FakeKeySetSource>,
    compiler: Arc<FakeJobCompiler>,
    dispatcher: Arc<FakeJobDispatcher>,
}

fn gitlab_token(project_id: &str) -> FakeToken {
    FakeToken {
        issuer: ISSUER.to_owned(),
        kid: Some("key-1".to_owned()),
        claims: json!({
            "iss": ISSUER,
            "project_id": project_id,
            "ref": "main",
        }),
        signature_valid: true,
    }
}

fn default_verifier() -> FakeTokenVerifier {
    FakeTokenVerifier::default()
        .with_token("token-76", gitlab_token("76"))
        .with_token("token-22", gitlab_token("22"))
        .with_token(
            "token-forged",
            FakeToken {
                signature_valid: false,
                ..gitlab_token("76")
            },
        )
        .with_token(
            "token-no-kid",
            FakeToken {
                kid: None,
                ..gitlab_token("76")
            },
        )
        .with_token(
            "token-rotated-kid",
            FakeToken {
                kid: Some("key-9".to_owned()),
                ..gitlab_token("76")
            },
        )
        .with_token(
            "token-foreign",
            FakeToken {
                issuer: "https://github.example.com".to_owned(),
                ..gitlab_token("76")
            },
        )
}

fn build_harness(
    role_repository: FakeRoleRepository,
    key_sets: FakeKeySetSource,
    dispatcher: FakeJobDispatcher,
) -> Harness {
    let role_repository = Arc::new(role_repository);
    let issuer_repository = Arc::new(FakeIssuerRepository::default());
    let key_sets = Arc::new(key_sets);
    let compiler = Arc::new(FakeJobCompiler::default());
    let dispatcher = Arc::new(dispatcher);

    let token_trust = TokenTrustService::new(
        issuer_repository.clone(),
        key_sets.clone(),
        Arc::new(default_verifier()),
    );

    Harness {
        admin: TrustAdminService::new(role_repository.clone(), issuer_repository),
        admission: AdmissionService::new(
            token_trust,
            role_repository,
            compiler.clone(),
            dispatcher.clone(),
        ),
        key_sets,
        compiler,
        dispatcher,
    }
}

async fn registered_harness() -> Harness {
    let harness = build_harness(
        FakeRoleRepository::default(),
        FakeKeySetSource::default(),
        FakeJobDispatcher::default(),
    );

    let issuer = harness.admin.register_issuer(ISSUER, KEY_SET_URL).await;
    assert!(issuer.is_ok());

    let role = harness
        .admin
        .register_role(
            "role-test",
            &json!({"project_id": "76"}),
            &json!({"Name": "^test-service$"}),
        )
        .await;
    assert!(role.is_ok());

    harness
}

fn request(token: &str, role_name: &str, job_name: &str) -> AdmissionRequest {
    AdmissionRequest {
        role_name: role_name.to_owned(),
        token: token.to_owned(),
        job_description: json!({
            "Name": job_name,
            "Type": "service",
            "TaskGroups": [{"Name": "web", "Tasks": [{"Name": "server", "Driver": "docker"}]}]
        })
        .to_string(),
    }
}

fn rejection_path(rejection: &Rejection) -> Option<&str> {
    rejection.path().map(PolicyPath::as_str)
}

#[tokio::test]
async fn register_role_returns_numeric_id() {
    let harness = build_harness(
        FakeRoleRepository::default(),
        FakeKeySetSource::default(),
        FakeJobDispatcher::default(),
    );

    let role = harness
        .admin
        .register_role(
            "role-test",
            &json!({"project_id": "76"}),
            &json!({"Name": "^test-service$"}),
        )
        .await;

    assert!(role.is_ok());
    assert_eq!(role.map(|record| record.id).unwrap_or_default(), 1);
}

#[tokio::test]
async fn matching_job_is_dispatched() {
    let harness = registered_harness().await;

    let result = harness
        .admission
        .admit(request("token-76", "role-test", "test-service"))
        .await;

    assert_eq!(result, Ok(json!({"EvalID": "eval-1", "JobModifyIndex": 7})));
    let dispatched = harness.dispatcher.dispatched.lock().await;
    assert_eq!(dispatched.len(), 1);
    assert_eq!(dispatched[0].get("Name"), Some(&json!("test-service")));
    assert_eq!(*harness.key_sets.fetched.lock().await, vec![KEY_SET_URL.to_owned()]);
}

#[tokio::test]
async fn bound_claims_mismatch_stops_before_compile() {
    let harness = registered_harness().await;

    let result = harness
        .admission
        .admit(request("token-22", "role-test", "test-service"))
        .await;

    let rejection = result.err().unwrap_or_else(|| unreachable!());
    assert!(matches!(rejection, Rejection::BoundClaimsMismatch { .. }));
    assert_eq!(rejection_path(&rejection), Some("ROOT.project_id"));
    assert!(harness.compiler.compiled.lock().await.is_empty());
    assert!(harness.dispatcher.dispatched.lock().await.is_empty());
}

#[tokio::test]
async fn job_spec_mismatch_stops_before_dispatch() {
    let harness = registered_harness().await;

    let result = harness
        .admission
        .admit(request("token-76", "role-test", "other-service"))
        .await;

    let rejection = result.err().unwrap_or_else(|| unreachable!());
    assert!(matches!(rejection, Rejection::JobSpecMismatch { .. }));
    assert_eq!(rejection_path(&rejection), Some("ROOT.Name"));
    assert_eq!(harness.compiler.compiled.lock().await.len(), 1);
    assert!(harness.dispatcher.dispatched.lock().await.is_empty());
}

#[tokio::test]
async fn unknown_role_never_compiles_or_dispatches() {
    let harness = registered_harness().await;

    let result = harness
        .admission
        .admit(request("token-76", "role-missing", "test-service"))
        .await;

    assert_eq!(
        result,
        Err(Rejection::UnknownRole {
            role_name: "role-missing".to_owned()
        })
    );
    assert!(harness.compiler.compiled.lock().await.is_empty());
    assert!(harness.dispatcher.dispatched.lock().await.is_empty());
}

#[tokio::test]
async fn malformed_token_is_rejected_before_key_fetch() {
    let harness = registered_harness().await;

    let result = harness
        .admission
        .admit(request("not-a-token", "role-test", "test-service"))
        .await;

    assert_eq!(
        result.err().map(|rejection| rejection.stage()),
        Some(RejectionStage::Token)
    );
    assert!(harness.key_sets.fetched.lock().await.is_empty());
}

#[tokio::test]
async fn untrusted_issuer_is_rejected() {
    let harness = registered_harness().await;

    let result = harness
        .admission
        .admit(request("token-foreign", "role-test", "test-service"))
        .await;

    assert_eq!(
        result,
        Err(Rejection::UnknownIssuer {
            issuer: "https://github.example.com".to_owned()
        })
    );
    assert!(harness.key_sets.fetched.lock().await.is_empty());
}

#[tokio::test]
async fn unreachable_key_set_is_a_fetch_failure() {
    let harness = build_harness(
        FakeRoleRepository::default(),
        FakeKeySetSource {
            fetched: Mutex::new(Vec::new()),
            unreachable: true,
        },
        FakeJobDispatcher::default(),
    );
    assert!(harness.admin.register_issuer(ISSUER, KEY_SET_URL).await.is_ok());

    let result = harness
        .admission
        .admit(request("token-76", "role-test", "test-service"))
        .await;

    assert_eq!(
        result,
        Err(Rejection::KeyFetchFailed {
            reason: "key set returned status 503".to_owned()
        })
    );
}

#[tokio::test]
async fn missing_or_unknown_kid_is_an_unknown_key() {
    let harness = registered_harness().await;

    for token in ["token-no-kid", "token-rotated-kid"] {
        let result = harness
            .admission
            .admit(request(token, "role-test", "test-service"))
            .await;

        assert_eq!(
            result.err().map(|rejection| rejection.stage()),
            Some(RejectionStage::Key)
        );
    }
}

#[tokio::test]
async fn forged_signature_is_rejected() {
    let harness = registered_harness().await;

    let result = harness
        .admission
        .admit(request("token-forged", "role-test", "test-service"))
        .await;

    assert_eq!(
        result,
        Err(Rejection::InvalidSignatureOrTime {
            reason: "InvalidSignature".to_owned()
        })
    );
    assert!(harness.dispatcher.dispatched.lock().await.is_empty());
}

#[tokio::test]
async fn compile_failure_is_reported() {
    let harness = registered_harness().await;

    let result = harness
        .admission
        .admit(AdmissionRequest {
            role_name: "role-test".to_owned(),
            token: "token-76".to_owned(),
            job_description: "job \"test-service\" {".to_owned(),
        })
        .await;

    assert_eq!(
        result.err().map(|rejection| rejection.stage()),
        Some(RejectionStage::Compile)
    );
    assert!(harness.dispatcher.dispatched.lock().await.is_empty());
}

#[tokio::test]
async fn dispatch_failure_is_reported_verbatim() {
    let harness = build_harness(
        FakeRoleRepository::default(),
        FakeKeySetSource::default(),
        FakeJobDispatcher {
            dispatched: Mutex::new(Vec::new()),
            rejecting: true,
        },
    );
    assert!(harness.admin.register_issuer(ISSUER, KEY_SET_URL).await.is_ok());
    assert!(
        harness
            .admin
            .register_role("role-test", &json!({}), &json!({}))
            .await
            .is_ok()
    );

    let result = harness
        .admission
        .admit(request("token-76", "role-test", "test-service"))
        .await;

    assert_eq!(
        result,
        Err(Rejection::DispatchFailed {
            reason: "permission denied".to_owned()
        })
    );
}

#[tokio::test]
async fn storage_failure_is_an_internal_rejection() {
    let harness = build_harness(
        FakeRoleRepository {
            unavailable: true,
            ..FakeRoleRepository::default()
        },
        FakeKeySetSource::default(),
        FakeJobDispatcher::default(),
    );
    assert!(harness.admin.register_issuer(ISSUER, KEY_SET_URL).await.is_ok());

    let result = harness
        .admission
        .admit(request("token-76", "role-test", "test-service"))
        .await;

    assert_eq!(
        result.err().map(|rejection| rejection.stage()),
        Some(RejectionStage::Storage)
    );
}

#[tokio::test]
async fn job_spec_skips_fields_missing_from_the_descriptor() {
    let harness = build_harness(
        FakeRoleRepository::default(),
        FakeKeySetSource::default(),
        FakeJobDispatcher::default(),
    );
    assert!(harness.admin.register_issuer(ISSUER, KEY_SET_URL).await.is_ok());
    assert!(
        harness
            .admin
            .register_role(
                "role-test",
                &json!({"project_id": "76"}),
                &json!({"TaskGroups": [{"Tasks": [{"Vault": {"Policies": ["^read-"]}}]}]}),
            )
            .await
            .is_ok()
    );

    let result = harness
        .admission
        .admit(request("token-76", "role-test", "test-service"))
        .await;

    assert!(result.is_ok());
}
