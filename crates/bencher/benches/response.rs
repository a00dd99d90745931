use bencher::{TestBody, TestCase};
use criterion::{BatchSize, BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use http::Method;
use micro_response::connection::BufConn;
use micro_response::pool::Pools;
use micro_response::protocol::RequestInfo;
use micro_response::response::Response;
use std::hint::black_box;
use std::io;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use tokio::io::{AsyncRead, AsyncWrite, ReadBuf};
use tokio::runtime::Runtime;

static HELLO: TestBody = TestBody::new(b"Hello World!\r\n");
static PAGE: TestBody = TestBody::new(include_bytes!("../src/lib.rs"));
static LARGE: [u8; 64 * 1024] = [b'x'; 64 * 1024];

/// Counts written bytes and drops them.
#[derive(Debug, Default)]
struct NullIo {
    written: usize,
}

impl AsyncRead for NullIo {
    fn poll_read(self: Pin<&mut Self>, _cx: &mut Context<'_>, _buf: &mut ReadBuf<'_>) -> Poll<io::Result<()>> {
        Poll::Ready(Ok(()))
    }
}

impl AsyncWrite for NullIo {
    fn poll_write(mut self: Pin<&mut Self>, _cx: &mut Context<'_>, buf: &[u8]) -> Poll<io::Result<usize>> {
        self.written += buf.len();
        Poll::Ready(Ok(buf.len()))
    }

    fn poll_flush(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Poll::Ready(Ok(()))
    }

    fn poll_shutdown(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Poll::Ready(Ok(()))
    }
}

fn create_test_cases() -> Vec<TestCase> {
    let large = TestBody::new(&LARGE);
    vec![
        TestCase::buffered("hello_world", HELLO),
        TestCase::buffered("small_page", PAGE),
        TestCase::streamed("large_body_4k_writes", large, 4 * 1024),
        TestCase::streamed("large_body_1k_writes", large, 1024),
    ]
}

async fn write_response(pools: &Arc<Pools>, case: &TestCase) -> usize {
    let conn = BufConn::new(NullIo::default(), pools);
    let mut response = Response::new(pools, RequestInfo::new(Method::GET), conn);

    for piece in case.pieces() {
        response.write(piece).await.expect("null io never fails");
    }
    response.finish_request().await.expect("null io never fails");

    let conn = response.release().expect("connection should stay open");
    conn.release(pools).written
}

fn benchmark_response_writer(criterion: &mut Criterion) {
    let runtime = Runtime::new().expect("tokio runtime should start");
    let pools = Arc::new(Pools::default());
    let mut group = criterion.benchmark_group("response_writer");

    for case in create_test_cases() {
        group.throughput(Throughput::Bytes(case.body().len() as u64));
        group.bench_with_input(BenchmarkId::new(format!("{:?}", case.group()), case.name()), &case, |b, case| {
            b.iter_batched(
                || (),
                |()| black_box(runtime.block_on(write_response(&pools, case))),
                BatchSize::SmallInput,
            );
        });
    }

    group.finish();
}

criterion_group!(response, benchmark_response_writer);
criterion_main!(response);
