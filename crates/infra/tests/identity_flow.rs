use std::sync::{Arc, Barrier};

use chrono::{DateTime, Duration, Utc};
use tenancy_auth::{
    CreateTenant, Hs256TokenIssuer, IdentityError, OAuthClaims, OAuthIdentity, ProviderLink, Role,
    TokenConfig, UpdateTenantSettings, require_staff,
};
use tenancy_infra::{IdentityStore, InMemoryIdentityStore, Provisioning};

fn issuer() -> Hs256TokenIssuer {
    Hs256TokenIssuer::new(TokenConfig::new("test-secret")).expect("valid config")
}

fn identity(id: &str, provider: &str, name: &str, email: &str) -> OAuthIdentity {
    OAuthIdentity {
        id: id.to_string(),
        provider: provider.to_string(),
        name: name.to_string(),
        email: email.to_string(),
    }
}

/// Runs the handshake token through sign + verify, like the request layer does.
fn completed_login(issuer: &Hs256TokenIssuer, identity: &OAuthIdentity, now: DateTime<Utc>) -> OAuthClaims {
    let token = issuer.issue_oauth(identity, now).expect("failed to issue oauth token");
    issuer.verify_oauth(&token, now).expect("failed to verify oauth token")
}

#[test]
fn creating_a_tenant_makes_the_founder_an_administrator() {
    tenancy_observability::init();
    let issuer = issuer();
    let now = Utc::now();
    let provisioning = Provisioning::new(InMemoryIdentityStore::new());

    let claims = completed_login(&issuer, &identity("g-1", "google", "Alice", "alice@acme.com"), now);
    let cmd = CreateTenant::new("tok-1", "Acme", "acme").with_user_claims(claims);

    let (tenant, founder) = provisioning.create_tenant(&cmd, now).unwrap();

    assert_eq!(tenant.subdomain(), "acme");
    assert_eq!(tenant.name, "Acme");
    assert_eq!(founder.role, Role::Administrator);
    assert_eq!(founder.tenant_id(), tenant.id());
    assert_eq!(founder.email, "alice@acme.com");
    assert_eq!(
        founder.providers().cloned().collect::<Vec<_>>(),
        vec![ProviderLink::new("google", "g-1")]
    );

    // The founder can now hold a session.
    let session = issuer.issue_session(&founder, now).unwrap();
    let claims = issuer.verify_session(&session, now).unwrap();
    assert_eq!(claims.user_id, founder.id);
    assert_eq!(claims.user_name, "Alice");
    assert_eq!(claims.user_email, "alice@acme.com");
}

#[test]
fn tenant_creation_without_login_is_rejected() {
    let provisioning = Provisioning::new(InMemoryIdentityStore::new());
    let cmd = CreateTenant::new("tok-1", "Acme", "acme");

    let err = provisioning.create_tenant(&cmd, Utc::now()).unwrap_err();
    assert!(matches!(err, IdentityError::Domain(_)));
    assert!(provisioning.store().get_tenant_by_subdomain("acme").unwrap().is_none());
}

#[test]
fn stale_handshake_cannot_create_a_tenant() {
    let issuer = issuer();
    let now = Utc::now();
    let provisioning = Provisioning::new(InMemoryIdentityStore::new());

    let claims = completed_login(&issuer, &identity("g-1", "google", "Alice", "alice@acme.com"), now);
    let cmd = CreateTenant::new("tok-1", "Acme", "acme").with_user_claims(claims);

    let err = provisioning
        .create_tenant(&cmd, now + Duration::minutes(30))
        .unwrap_err();
    assert_eq!(err, IdentityError::ExpiredClaims);
}

#[test]
fn visitor_cannot_run_administrator_actions() {
    let issuer = issuer();
    let now = Utc::now();
    let provisioning = Provisioning::new(InMemoryIdentityStore::new());

    let founder_login = completed_login(&issuer, &identity("g-1", "google", "Alice", "alice@acme.com"), now);
    let (tenant, _) = provisioning
        .create_tenant(&CreateTenant::new("tok-1", "Acme", "acme").with_user_claims(founder_login), now)
        .unwrap();

    let visitor_login = completed_login(&issuer, &identity("gh-7", "github", "Bob", "bob@example.com"), now);
    let visitor = provisioning.sign_in_with_oauth(tenant.id(), &visitor_login, now).unwrap();
    assert_eq!(visitor.role, Role::Visitor);
    assert!(!visitor.is_staff());
    assert!(require_staff(&visitor).is_err());

    let settings = UpdateTenantSettings {
        title: "Hijacked".to_string(),
        invitation: String::new(),
        welcome_message: String::new(),
        user_claims: None,
    };
    let err = provisioning
        .update_tenant_settings(&visitor, tenant.id(), &settings, now)
        .unwrap_err();

    assert_eq!(
        err,
        IdentityError::Forbidden {
            required: Role::Administrator,
            actual: Role::Visitor
        }
    );
    assert_eq!(provisioning.store().get_tenant(tenant.id()).unwrap().name, "Acme");
}

#[test]
fn administrator_updates_settings_and_promotes_members() {
    let issuer = issuer();
    let now = Utc::now();
    let provisioning = Provisioning::new(InMemoryIdentityStore::new());

    let founder_login = completed_login(&issuer, &identity("g-1", "google", "Alice", "alice@acme.com"), now);
    let (tenant, admin) = provisioning
        .create_tenant(&CreateTenant::new("tok-1", "Acme", "acme").with_user_claims(founder_login), now)
        .unwrap();

    let settings = UpdateTenantSettings {
        title: "Acme Feedback".to_string(),
        invitation: "Share your ideas".to_string(),
        welcome_message: "Welcome to Acme".to_string(),
        user_claims: None,
    };
    let updated = provisioning
        .update_tenant_settings(&admin, tenant.id(), &settings, now)
        .unwrap();
    assert_eq!(updated.name, "Acme Feedback");
    assert_eq!(updated.subdomain(), "acme");

    let bob_login = completed_login(&issuer, &identity("gh-7", "github", "Bob", "bob@example.com"), now);
    let bob = provisioning.sign_in_with_oauth(tenant.id(), &bob_login, now).unwrap();

    let promoted = provisioning.change_role(&admin, bob.id, Role::Member).unwrap();
    assert!(promoted.is_staff());

    let err = provisioning.change_role(&promoted, admin.id, Role::Visitor).unwrap_err();
    assert!(matches!(err, IdentityError::Forbidden { .. }));
}

#[test]
fn login_with_new_provider_links_existing_user_by_email() {
    let issuer = issuer();
    let now = Utc::now();
    let provisioning = Provisioning::new(InMemoryIdentityStore::new());

    let google = completed_login(&issuer, &identity("g-1", "google", "Alice", "alice@acme.com"), now);
    let (tenant, founder) = provisioning
        .create_tenant(&CreateTenant::new("tok-1", "Acme", "acme").with_user_claims(google.clone()), now)
        .unwrap();

    let github = completed_login(&issuer, &identity("gh-1", "github", "alice", "alice@acme.com"), now);
    let linked = provisioning.sign_in_with_oauth(tenant.id(), &github, now).unwrap();
    assert_eq!(linked.id, founder.id);
    assert!(linked.has_provider("google"));
    assert!(linked.has_provider("github"));

    // Same provider again resolves to the same user without adding a link.
    let again = provisioning.sign_in_with_oauth(tenant.id(), &google, now).unwrap();
    assert_eq!(again.id, founder.id);
    assert_eq!(again.providers().count(), 2);

    let err = provisioning.link_provider(founder.id, &github, now).unwrap_err();
    assert_eq!(err, IdentityError::duplicate_provider("github"));
}

#[test]
fn an_external_identity_belongs_to_one_user_per_tenant() {
    let issuer = issuer();
    let now = Utc::now();
    let provisioning = Provisioning::new(InMemoryIdentityStore::new());

    let google = completed_login(&issuer, &identity("g-1", "google", "Alice", "alice@acme.com"), now);
    let (tenant, alice) = provisioning
        .create_tenant(&CreateTenant::new("tok-1", "Acme", "acme").with_user_claims(google), now)
        .unwrap();
    let bob_login = completed_login(&issuer, &identity("gh-7", "github", "Bob", "bob@example.com"), now);
    let bob = provisioning.sign_in_with_oauth(tenant.id(), &bob_login, now).unwrap();

    let alice_google = completed_login(&issuer, &identity("g-1", "google", "Bob", "bob@example.com"), now);
    let err = provisioning.link_provider(bob.id, &alice_google, now).unwrap_err();
    assert!(matches!(err, IdentityError::Domain(_)));

    let resolved = provisioning.sign_in_with_oauth(tenant.id(), &alice_google, now).unwrap();
    assert_eq!(resolved.id, alice.id);
}

#[test]
fn settings_update_keeps_custom_domain() {
    let issuer = issuer();
    let now = Utc::now();
    let provisioning = Provisioning::new(InMemoryIdentityStore::new());

    let login = completed_login(&issuer, &identity("g-1", "google", "Alice", "alice@acme.com"), now);
    let (tenant, admin) = provisioning
        .create_tenant(&CreateTenant::new("tok-1", "Acme", "acme").with_user_claims(login), now)
        .unwrap();
    provisioning.set_cname(&admin, tenant.id(), "feedback.acme.com").unwrap();

    let settings = UpdateTenantSettings {
        title: "Acme Feedback".to_string(),
        invitation: String::new(),
        welcome_message: String::new(),
        user_claims: None,
    };
    let updated = provisioning
        .update_tenant_settings(&admin, tenant.id(), &settings, now)
        .unwrap();

    assert_eq!(updated.cname, "feedback.acme.com");
    assert_eq!(provisioning.store().get_tenant(tenant.id()).unwrap().cname, "feedback.acme.com");
}

#[test]
fn racing_tenant_creations_for_one_subdomain_have_one_winner() {
    let issuer = issuer();
    let now = Utc::now();
    let provisioning = Provisioning::new(Arc::new(InMemoryIdentityStore::new()));
    let barrier = Barrier::new(2);

    let commands = [
        identity("g-1", "google", "Alice", "alice@acme.com"),
        identity("gh-2", "github", "Mallory", "mallory@example.com"),
    ]
    .map(|who| {
        CreateTenant::new("tok-1", "Acme", "acme").with_user_claims(completed_login(&issuer, &who, now))
    });

    let results: Vec<_> = std::thread::scope(|scope| {
        let handles: Vec<_> = commands
            .iter()
            .map(|cmd| {
                let provisioning = &provisioning;
                let barrier = &barrier;
                scope.spawn(move || {
                    barrier.wait();
                    provisioning.create_tenant(cmd, now)
                })
            })
            .collect();
        handles
            .into_iter()
            .map(|h| h.join().expect("creation thread panicked"))
            .collect()
    });

    assert_eq!(results.iter().filter(|r| r.is_ok()).count(), 1);
    let conflicts: Vec<_> = results.into_iter().filter_map(Result::err).collect();
    assert_eq!(conflicts, vec![IdentityError::subdomain_conflict("acme")]);
}

#[test]
fn racing_provider_links_have_one_winner() {
    let issuer = issuer();
    let now = Utc::now();
    let provisioning = Provisioning::new(InMemoryIdentityStore::new());

    let google = completed_login(&issuer, &identity("g-1", "google", "Alice", "alice@acme.com"), now);
    let (_, founder) = provisioning
        .create_tenant(&CreateTenant::new("tok-1", "Acme", "acme").with_user_claims(google), now)
        .unwrap();

    let logins = [
        completed_login(&issuer, &identity("gh-1", "github", "Alice", "alice@acme.com"), now),
        completed_login(&issuer, &identity("gh-2", "github", "Alice", "alice@acme.com"), now),
    ];
    let barrier = Barrier::new(2);

    let outcomes: Vec<bool> = std::thread::scope(|scope| {
        let handles: Vec<_> = logins
            .iter()
            .map(|claims| {
                let provisioning = &provisioning;
                let barrier = &barrier;
                scope.spawn(move || {
                    barrier.wait();
                    provisioning.link_provider(founder.id, claims, now).is_ok()
                })
            })
            .collect();
        handles
            .into_iter()
            .map(|h| h.join().expect("link thread panicked"))
            .collect()
    });

    assert_eq!(outcomes.iter().filter(|ok| **ok).count(), 1);
    let stored = provisioning.store().get_user(founder.id).unwrap();
    assert_eq!(stored.providers().filter(|l| l.name == "github").count(), 1);
}

#[test]
fn handshake_expires_before_a_session_issued_at_the_same_instant() {
    let issuer = issuer();
    let now = Utc::now();
    let provisioning = Provisioning::new(InMemoryIdentityStore::new());

    let oauth = issuer
        .oauth_claims(&identity("g-1", "google", "Alice", "alice@acme.com"), now)
        .unwrap();
    let (_, founder) = provisioning
        .create_tenant(&CreateTenant::new("tok-1", "Acme", "acme").with_user_claims(oauth.clone()), now)
        .unwrap();
    let session = issuer.session_claims(&founder, now).unwrap();

    assert!(oauth.standard.expires_at < session.standard.expires_at);
}
