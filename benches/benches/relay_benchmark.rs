use std::hint::black_box;

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};

use pubrelay::{Consumer, Inbox, Message, Relay};

fn consumers(
    relay: &Relay<Message>,
    n: usize,
    capacity: usize,
) -> Vec<(Consumer<Message>, Inbox<Message>)> {
    (0..n)
        .map(|_| {
            let (c, inbox) = Consumer::bounded(capacity);
            relay.subscribe(&c, &[&"chan"]);
            (c, inbox)
        })
        .collect()
}

fn bench_subscribe_unsubscribe(c: &mut Criterion) {
    let relay = Relay::<Message>::new();
    let (consumer, _inbox) = Consumer::bounded(1);
    c.bench_function("subscribe_unsubscribe", |b| {
        b.iter(|| {
            relay.subscribe(black_box(&consumer), &[&"a", &"b", &"c"]);
            relay.unsubscribe(black_box(&consumer));
        })
    });
}

/// Публикация с вычиткой: каждая доставка проходит успешно.
fn bench_publish_fanout(c: &mut Criterion) {
    let mut group = c.benchmark_group("publish_fanout");
    for n in [1usize, 10, 100] {
        let relay = Relay::new();
        let mut subs = consumers(&relay, n, 1);
        let msg = Message::new("chan", "x");
        group.bench_with_input(BenchmarkId::from_parameter(n), &n, |b, _| {
            b.iter(|| {
                relay.publish(black_box(msg.clone()));
                for (_, inbox) in subs.iter_mut() {
                    let _ = inbox.try_recv();
                }
            })
        });
    }
    group.finish();
}

/// Публикация в заполненные буферы: все доставки отбрасываются.
fn bench_publish_full_buffers(c: &mut Criterion) {
    let relay = Relay::new();
    let _subs = consumers(&relay, 100, 1);
    relay.publish(Message::named("chan"));
    let msg = Message::named("chan");
    c.bench_function("publish_100_full", |b| {
        b.iter(|| relay.publish(black_box(msg.clone())))
    });
}

/// Публикация имени, на которое никто не подписан, среди 100 потребителей.
fn bench_publish_no_match(c: &mut Criterion) {
    let relay = Relay::new();
    let _subs = consumers(&relay, 100, 1);
    let msg = Message::named("other");
    c.bench_function("publish_100_no_match", |b| {
        b.iter(|| relay.publish(black_box(msg.clone())))
    });
}

criterion_group!(
    benches,
    bench_subscribe_unsubscribe,
    bench_publish_fanout,
    bench_publish_full_buffers,
    bench_publish_no_match
);
criterion_main!(benches);
