//! Contract tests run against every reference backend

use signing_plugin::config::{BackendKind, PluginConfig};
use signing_plugin::{
    create_plugin, generate_key_pair, verify_hash, Digest, PrivateKey, ReturnCode, SignAlgo,
    SignatureBuffer, SignatureRequest, SignerError, SigningPlugin, HASH_DIGEST_SIZE,
};
use std::time::{Duration, Instant};

const BACKENDS: [BackendKind; 2] = [BackendKind::Software, BackendKind::Threaded];

fn plugin(backend: BackendKind) -> Box<dyn SigningPlugin> {
    create_plugin(&PluginConfig {
        backend,
        ..PluginConfig::default()
    })
}

fn poll_until_signed(plugin: &mut dyn SigningPlugin, output: &mut SignatureBuffer) {
    let deadline = Instant::now() + Duration::from_secs(30);
    while !plugin.get_signature(output) {
        assert!(Instant::now() < deadline, "signature never arrived");
        std::thread::sleep(Duration::from_millis(1));
    }
}

#[test]
fn test_sign_then_verify_for_all_algorithms() {
    for backend in BACKENDS {
        for algo in SignAlgo::ALL {
            let (private_key, public_key) = generate_key_pair(algo).unwrap();
            let max_signature_size = private_key.max_signature_size();

            let mut plugin = plugin(backend);
            assert_eq!(ReturnCode::of(&plugin.setup()), ReturnCode::Ok);

            let hash = signing_plugin::hash_data(format!("{:?}/{}", backend, algo).as_bytes());
            plugin
                .sign_hash(SignatureRequest::new(hash, private_key))
                .unwrap();

            let mut output = plugin.allocate(max_signature_size).unwrap();
            poll_until_signed(plugin.as_mut(), &mut output);

            assert!(output.len() <= output.capacity());
            assert!(output.len() <= max_signature_size);
            assert!(
                verify_hash(&public_key, &hash, output.as_slice()).unwrap(),
                "{:?}/{} signature must verify",
                backend,
                algo
            );

            plugin.release(Some(output));
            plugin.teardown();
        }
    }
}

#[test]
fn test_zero_hash_ecdsa_scenario() {
    let (private_key, public_key) = generate_key_pair(SignAlgo::Ecdsa).unwrap();
    let private_pem = private_key.to_pem().unwrap();
    let public_pem = public_key.to_pem().unwrap();

    let mut plugin = plugin(BackendKind::Threaded);
    plugin.setup().unwrap();

    let request = SignatureRequest::from_raw(
        &[0u8; HASH_DIGEST_SIZE],
        SignAlgo::Ecdsa as u32,
        private_pem.as_bytes(),
        Some(public_pem.as_bytes()),
    )
    .unwrap();
    let max_signature_size = request.max_signature_size();
    plugin.sign_hash(request).unwrap();

    let mut output = plugin.allocate(max_signature_size).unwrap();
    poll_until_signed(plugin.as_mut(), &mut output);

    let zero_hash = Digest::new([0u8; HASH_DIGEST_SIZE]);
    assert!(verify_hash(&public_key, &zero_hash, output.as_slice()).unwrap());

    plugin.teardown();
}

#[test]
fn test_get_signature_on_fresh_session() {
    for backend in BACKENDS {
        let mut plugin = plugin(backend);
        plugin.setup().unwrap();

        let mut output = plugin.allocate(16).unwrap();
        output.write(&[0x5A; 16]).unwrap();

        assert!(!plugin.get_signature(&mut output));
        assert_eq!(output.as_slice(), &[0x5A; 16]);
    }
}

#[test]
fn test_teardown_before_setup_and_twice() {
    for backend in BACKENDS {
        let mut plugin = plugin(backend);
        plugin.teardown();
        plugin.teardown();

        assert!(plugin.setup().is_ok());
        plugin.teardown();
        plugin.teardown();
        assert!(plugin.setup().is_ok());
    }
}

#[test]
fn test_allocate_edge_sizes() {
    for backend in BACKENDS {
        let plugin = plugin(backend);

        let empty = plugin.allocate(0).unwrap();
        assert_eq!(empty.capacity(), 0);
        plugin.release(Some(empty));

        assert!(plugin.allocate(usize::MAX).is_none());
        plugin.release(None);
    }
}

#[test]
fn test_out_of_range_algorithm_is_a_configuration_error() {
    let pem = PrivateKey::generate(SignAlgo::Ecdsa).unwrap().to_pem().unwrap();

    for raw in [2u32, 3, 255, u32::MAX] {
        let result = SignatureRequest::from_raw(&[0u8; 32], raw, pem.as_bytes(), None);
        assert_eq!(ReturnCode::of(&result), ReturnCode::UnsupportedAlgorithm);
    }
}

#[test]
fn test_sign_before_setup_and_after_teardown() {
    for backend in BACKENDS {
        let key = PrivateKey::generate(SignAlgo::Ecdsa).unwrap();
        let mut plugin = plugin(backend);

        let result = plugin.sign_hash(SignatureRequest::new(Digest::new([1u8; 32]), key.clone()));
        assert!(matches!(result, Err(SignerError::InvalidState(_))));

        plugin.setup().unwrap();
        plugin.teardown();

        let result = plugin.sign_hash(SignatureRequest::new(Digest::new([1u8; 32]), key));
        assert_eq!(ReturnCode::of(&result), ReturnCode::NotInitialized);
    }
}

#[test]
fn test_request_ids_are_distinct() {
    for backend in BACKENDS {
        let key = PrivateKey::generate(SignAlgo::Ecdsa).unwrap();
        let mut plugin = plugin(backend);
        plugin.setup().unwrap();

        let first = plugin
            .sign_hash(SignatureRequest::new(Digest::new([1u8; 32]), key.clone()))
            .unwrap();
        let second = plugin
            .sign_hash(SignatureRequest::new(Digest::new([2u8; 32]), key))
            .unwrap();
        assert_ne!(first, second);
        assert!(first < second);
    }
}
