//! End-to-end scenarios for CachingProxy over the demo models.
//!
//! Covers the echo and sentiment walkthroughs, failure handling, and layering with Validated.


use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use memoproxy::{
    predictor_fn, CacheStats, CacheStatus, CachingProxy, EchoModel, PredictError, Predictor,
    SentimentModel, Validated,
};

#[tokio::test]
async fn echo_model_second_call_is_served_from_cache() {
    let proxy = CachingProxy::new(EchoModel::new());
    let input = "Some input text".to_string();

    let first = proxy.predict(&input).await.unwrap();
    assert_eq!(first, "Prediction for Some input text");
    assert_eq!(proxy.inner().calls(), 1);

    let second = proxy.predict(&input).await.unwrap();
    assert_eq!(second, first);
    assert_eq!(proxy.inner().calls(), 1);
}

#[tokio::test]
async fn sentiment_sequence_calls_model_three_times() {
    let proxy = CachingProxy::new(SentimentModel::new());
    let mut outputs = Vec::new();
    let mut statuses = Vec::new();
    for text in ["happy face", "sad face", "cat face", "sad face", "cat face"] {
        let (value, status) = proxy.predict_with_status(&text.to_string()).await.unwrap();
        outputs.push(value);
        statuses.push(status);
    }

    assert_eq!(outputs, vec![1, -1, 0, -1, 0]);
    assert_eq!(
        statuses,
        vec![
            CacheStatus::Miss,
            CacheStatus::Miss,
            CacheStatus::Miss,
            CacheStatus::Hit,
            CacheStatus::Hit
        ]
    );
    assert_eq!(proxy.inner().calls(), 3);
    assert_eq!(
        proxy.stats(),
        CacheStats {
            hits: 2,
            misses: 3,
            failures: 0,
            entries: 3
        }
    );
}

#[tokio::test]
async fn distinct_keys_are_independent() {
    let proxy = CachingProxy::new(EchoModel::new());
    let x = proxy.predict(&"x".to_string()).await.unwrap();
    let y = proxy.predict(&"y".to_string()).await.unwrap();
    assert_eq!(x, "Prediction for x");
    assert_eq!(y, "Prediction for y");
    assert!(proxy.contains(&"x".to_string()));
    assert!(proxy.contains(&"y".to_string()));
    assert!(!proxy.contains(&"z".to_string()));
}

#[tokio::test]
async fn repeated_requests_do_not_change_behaviour() {
    let proxy = CachingProxy::new(SentimentModel::new());
    let key = "happy".to_string();
    for _ in 0..5 {
        assert_eq!(proxy.predict(&key).await, Ok(1));
    }
    assert_eq!(proxy.len(), 1);
    assert_eq!(proxy.inner().calls(), 1);
    assert_eq!(proxy.predict(&"sad".to_string()).await, Ok(-1));
    assert_eq!(proxy.predict(&key).await, Ok(1));
}

#[tokio::test]
async fn model_error_is_propagated_unchanged_and_retried() {
    let calls = AtomicUsize::new(0);
    let proxy = CachingProxy::new(predictor_fn(|t: &String| {
        if calls.fetch_add(1, Ordering::SeqCst) < 2 {
            Err(PredictError::Model(format!("timeout scoring {}", t)))
        } else {
            Ok(t.to_uppercase())
        }
    }));
    let key = "retry me".to_string();

    for _ in 0..2 {
        assert_eq!(
            proxy.predict(&key).await,
            Err(PredictError::Model("timeout scoring retry me".into()))
        );
        assert!(!proxy.contains(&key));
    }
    assert_eq!(proxy.predict(&key).await, Ok("RETRY ME".to_string()));
    assert_eq!(proxy.predict(&key).await, Ok("RETRY ME".to_string()));
    assert_eq!(calls.load(Ordering::SeqCst), 3);
    assert_eq!(proxy.stats().failures, 2);
}

#[tokio::test]
async fn validated_proxy_rejects_blank_input_before_cache() {
    let model = Arc::new(EchoModel::new());
    let guarded = Validated::new(CachingProxy::new(Arc::clone(&model)));

    assert!(matches!(
        guarded.predict(&String::new()).await,
        Err(PredictError::InvalidInput(_))
    ));
    assert_eq!(
        guarded.predict(&" raw_data ".to_string()).await,
        Ok("Prediction for  raw_data ".to_string())
    );
    assert_eq!(guarded.inner().len(), 1);
    assert_eq!(model.calls(), 1);
}

#[tokio::test]
async fn shared_proxy_across_tasks_computes_each_key_once() {
    let proxy = Arc::new(CachingProxy::new(SentimentModel::new()));
    let mut handles = Vec::new();
    for i in 0..16 {
        let proxy = Arc::clone(&proxy);
        let text = if i % 2 == 0 { "happy" } else { "sad" };
        handles.push(tokio::spawn(async move {
            proxy.predict(&text.to_string()).await
        }));
    }
    for h in handles {
        assert!(h.await.unwrap().is_ok());
    }
    assert_eq!(proxy.inner().calls(), 2);
    assert_eq!(proxy.len(), 2);
}
