//! End-to-end setup flow over loopback sockets

mod common;

use common::{refused_target, status_body, FakeDevice, Reply};
use std::collections::HashSet;
use sw16_setup::{
    AbortReason, ConnectionProber, EntryDescriptor, EntryStore, ErrorCode, FlowState, ImportStep,
    SetupConfig, SetupFlow, SetupRequest, Sw16Codec, UserInput, UserStep,
};
use tokio::net::TcpListener;

fn config() -> SetupConfig {
    SetupConfig::default().timeout(2)
}

fn prober() -> ConnectionProber<Sw16Codec> {
    ConnectionProber::new(Sw16Codec::new())
}

#[tokio::test]
async fn unreachable_device_reshows_form() {
    let target = refused_target().await;
    let mut flow = SetupFlow::new(prober(), HashSet::new(), config());

    let input = UserInput::new(target.host()).port(target.port());
    match flow.start_with_user_input(Some(input)).await.unwrap() {
        UserStep::ShowForm(form) => {
            assert_eq!(form.step_id, "user");
            assert_eq!(form.base_error(), Some(ErrorCode::CannotConnect));
        }
        other => panic!("unexpected step: {other:?}"),
    }
    assert_eq!(flow.state(), FlowState::AwaitingInput);
}

#[tokio::test]
async fn configured_device_is_never_contacted() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    let registry: HashSet<String> = [format!("127.0.0.1:{port}")].into_iter().collect();
    let mut flow = SetupFlow::new(prober(), registry, config());

    let step = flow
        .start_with_user_input(Some(UserInput::new("127.0.0.1").port(port)))
        .await
        .unwrap();

    match step {
        UserStep::ShowForm(form) => {
            assert_eq!(form.base_error(), Some(ErrorCode::AlreadyConfigured));
        }
        other => panic!("unexpected step: {other:?}"),
    }

    let accepted =
        tokio::time::timeout(std::time::Duration::from_millis(200), listener.accept()).await;
    assert!(accepted.is_err(), "duplicate check opened a connection");
}

#[tokio::test]
async fn responsive_device_creates_entry() {
    let device = FakeDevice::spawn(Reply::Frame(status_body())).await;
    let target = device.target();
    let mut flow = SetupFlow::new(prober(), HashSet::new(), config());

    let step = flow
        .start_with_user_input(Some(UserInput::new(target.host()).port(target.port())))
        .await
        .unwrap();

    assert_eq!(
        step,
        UserStep::CreateEntry(EntryDescriptor {
            title: target.key(),
            host: target.host().to_string(),
            port: target.port(),
            display_name: None,
        })
    );
    assert_eq!(flow.state(), FlowState::Completed);
    assert!(device.finish().await.client_closed);
}

#[tokio::test]
async fn unreachable_import_aborts() {
    let target = refused_target().await;
    let mut flow = SetupFlow::new(prober(), HashSet::new(), config());

    let step = flow
        .start_with_import(SetupRequest::new(target.host(), target.port()))
        .await
        .unwrap();
    assert_eq!(step, ImportStep::Abort(AbortReason::CannotConnect));
}

#[tokio::test]
async fn store_rejects_second_setup_of_same_device() {
    let tmp = tempfile::tempdir().unwrap();
    let store = EntryStore::open(tmp.path().join("entries.json")).unwrap();

    let device = FakeDevice::spawn(Reply::Frame(status_body())).await;
    let target = device.target();
    let mut flow = SetupFlow::new(prober(), store, config());

    let request = SetupRequest::new(target.host(), target.port()).display_name("Workshop");
    let entry = match flow.start_with_import(request.clone()).await.unwrap() {
        ImportStep::CreateEntry(entry) => entry,
        other => panic!("unexpected step: {other:?}"),
    };
    assert_eq!(entry.title, "Workshop");
    device.finish().await;

    let mut store = flow.into_registry();
    store.add(entry).unwrap();

    let mut second = SetupFlow::new(prober(), store, config());
    assert_eq!(
        second.start_with_import(request).await.unwrap(),
        ImportStep::Abort(AbortReason::AlreadySetup)
    );
}
