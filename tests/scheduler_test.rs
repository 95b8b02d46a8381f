use std::cell::{Cell, RefCell};
use std::rc::Rc;

use futures::future::{FutureExt, LocalBoxFuture};
use sl24_augment::dom::{Fragment, HostDom, MemoryDom};
use sl24_augment::scheduler::{CycleOutcome, Evaluator, HostEvent, MutationScheduler, SchedulerState};
use tokio_test::assert_ok;

const COURSE_URL: &str = "https://www.sprachenlernen24-onlinekurs.de/login/?kurs=Daenisch";

/// 给每个 `.item` 追加一个 `.patch`，已经有的跳过
struct Patcher {
    runs: Rc<Cell<usize>>,
    at_startup: bool,
}

impl Evaluator<MemoryDom> for Patcher {
    fn name(&self) -> &'static str {
        "patcher"
    }

    fn runs_at_startup(&self) -> bool {
        self.at_startup
    }

    fn evaluate<'a>(&'a mut self, dom: &'a MemoryDom) -> LocalBoxFuture<'a, anyhow::Result<()>> {
        async move {
            self.runs.set(self.runs.get() + 1);
            for item in dom.query_all(".item").await? {
                if dom.has_marker(item, "patch").await? {
                    continue;
                }
                dom.append(item, &Fragment::new("span").class("patch")).await?;
                dom.set_marker(item, "patch").await?;
            }
            Ok(())
        }
        .boxed_local()
    }
}

struct Failing;

impl Evaluator<MemoryDom> for Failing {
    fn name(&self) -> &'static str {
        "failing"
    }

    fn evaluate<'a>(&'a mut self, _dom: &'a MemoryDom) -> LocalBoxFuture<'a, anyhow::Result<()>> {
        async { anyhow::bail!("selector exploded") }.boxed_local()
    }
}

struct Recorder {
    values: Rc<RefCell<Vec<String>>>,
}

impl Evaluator<MemoryDom> for Recorder {
    fn name(&self) -> &'static str {
        "recorder"
    }

    fn evaluate<'a>(&'a mut self, _dom: &'a MemoryDom) -> LocalBoxFuture<'a, anyhow::Result<()>> {
        async { Ok(()) }.boxed_local()
    }

    fn on_text_committed(&mut self, value: &str) {
        self.values.borrow_mut().push(value.to_string());
    }
}

fn patcher(at_startup: bool) -> (Patcher, Rc<Cell<usize>>) {
    let runs = Rc::new(Cell::new(0));
    (
        Patcher {
            runs: runs.clone(),
            at_startup,
        },
        runs,
    )
}

#[tokio::test]
async fn test_start_runs_startup_evaluators_then_observes() {
    let (eager, eager_runs) = patcher(true);
    let (lazy, lazy_runs) = patcher(false);
    let mut scheduler = MutationScheduler::new(MemoryDom::new(COURSE_URL));
    scheduler.register(eager).register(lazy);

    assert_ok!(scheduler.start().await);

    assert_eq!(eager_runs.get(), 1);
    assert_eq!(lazy_runs.get(), 0);
    assert_eq!(scheduler.state(), SchedulerState::Observing);
    assert_eq!(scheduler.dom().prepare_calls(), 1);
    assert_eq!(scheduler.dom().observing_generation(), Some(scheduler.generation()));
    assert_eq!(scheduler.stats().startup_runs, 1);
}

#[tokio::test]
async fn test_burst_of_mutations_runs_one_cycle() {
    let (evaluator, runs) = patcher(false);
    let mut scheduler = MutationScheduler::new(MemoryDom::new(COURSE_URL));
    scheduler.register(evaluator);
    assert_ok!(scheduler.start().await);

    let body = scheduler.dom().body();
    for _ in 0..5 {
        scheduler.dom().add_element(body, "div", &["item"]).unwrap();
    }
    let events = scheduler.dom().take_events();
    assert_eq!(events.len(), 5);

    let mut outcomes = Vec::new();
    for event in events {
        outcomes.push(scheduler.handle(event).await.unwrap());
    }

    assert_eq!(outcomes[0], Some(CycleOutcome::Completed { evaluators: 1 }));
    assert!(outcomes[1..]
        .iter()
        .all(|o| *o == Some(CycleOutcome::Coalesced)));
    assert_eq!(runs.get(), 1);
    assert_eq!(scheduler.stats().cycles, 1);
    assert_eq!(scheduler.stats().coalesced, 4);

    // 求值器自己的写入发生在断开期间，不会再触发
    assert_eq!(scheduler.dom().find_by_class("patch").len(), 5);
    assert!(scheduler.dom().take_events().is_empty());
    assert_eq!(scheduler.dom().settle_calls(), 1);
}

#[tokio::test]
async fn test_each_settled_state_gets_its_own_cycle() {
    let (evaluator, runs) = patcher(false);
    let mut scheduler = MutationScheduler::new(MemoryDom::new(COURSE_URL));
    scheduler.register(evaluator);
    assert_ok!(scheduler.start().await);
    let body = scheduler.dom().body();

    for round in 1..=3 {
        scheduler.dom().add_element(body, "div", &["item"]).unwrap();
        let events = scheduler.dom().take_events();
        for event in events {
            scheduler.handle(event).await.unwrap();
        }
        assert_eq!(runs.get(), round);
    }
    assert_eq!(scheduler.stats().coalesced, 0);
}

#[tokio::test]
async fn test_failing_evaluator_aborts_cycle_but_rearms() {
    let (evaluator, runs) = patcher(false);
    let mut scheduler = MutationScheduler::new(MemoryDom::new(COURSE_URL));
    scheduler.register(Failing).register(evaluator);
    assert_ok!(scheduler.start().await);
    let before = scheduler.generation();

    let body = scheduler.dom().body();
    scheduler.dom().add_element(body, "div", &["item"]).unwrap();
    let event = scheduler.dom().take_events().remove(0);
    let outcome = scheduler.handle(event).await.unwrap();

    match outcome {
        Some(CycleOutcome::Aborted { evaluator, error }) => {
            assert_eq!(evaluator, "failing");
            assert!(error.contains("selector exploded"));
        }
        other => panic!("unexpected outcome: {:?}", other),
    }
    assert_eq!(runs.get(), 0);
    assert_eq!(scheduler.state(), SchedulerState::Observing);
    assert_eq!(scheduler.generation(), before + 1);
    assert_eq!(scheduler.dom().observing_generation(), Some(before + 1));
    assert_eq!(scheduler.stats().aborted_cycles, 1);
}

#[tokio::test]
async fn test_mutation_before_start_is_coalesced() {
    let (evaluator, runs) = patcher(false);
    let mut scheduler = MutationScheduler::new(MemoryDom::new(COURSE_URL));
    scheduler.register(evaluator);

    let outcome = scheduler
        .handle(HostEvent::Mutation { generation: 0 })
        .await
        .unwrap();

    assert_eq!(outcome, Some(CycleOutcome::Coalesced));
    assert_eq!(runs.get(), 0);
    assert_eq!(scheduler.state(), SchedulerState::Idle);
}

#[tokio::test]
async fn test_text_committed_reaches_evaluators() {
    let values = Rc::new(RefCell::new(Vec::new()));
    let mut scheduler = MutationScheduler::new(MemoryDom::new(COURSE_URL));
    scheduler.register(Recorder {
        values: values.clone(),
    });
    assert_ok!(scheduler.start().await);

    let outcome = scheduler
        .handle(HostEvent::TextCommitted {
            value: "at lege".to_string(),
        })
        .await
        .unwrap();

    assert_eq!(outcome, None);
    assert_eq!(*values.borrow(), vec!["at lege".to_string()]);
}

#[tokio::test]
async fn test_document_reload_restarts() {
    let (evaluator, runs) = patcher(true);
    let mut scheduler = MutationScheduler::new(MemoryDom::new(COURSE_URL));
    scheduler.register(evaluator);
    assert_ok!(scheduler.start().await);
    let before = scheduler.generation();

    scheduler.handle(HostEvent::DocumentReloaded).await.unwrap();

    assert_eq!(runs.get(), 2);
    assert_eq!(scheduler.dom().prepare_calls(), 2);
    assert_eq!(scheduler.state(), SchedulerState::Observing);
    assert!(scheduler.generation() > before);

    // 旧文档的通知已过期
    let outcome = scheduler
        .handle(HostEvent::Mutation { generation: before })
        .await
        .unwrap();
    assert_eq!(outcome, Some(CycleOutcome::Coalesced));
}

#[tokio::test]
async fn test_rearm_retries_after_observe_failure() {
    let (evaluator, runs) = patcher(false);
    let mut scheduler = MutationScheduler::new(MemoryDom::new(COURSE_URL));
    scheduler.register(evaluator);
    assert_ok!(scheduler.start().await);

    let body = scheduler.dom().body();
    scheduler.dom().add_element(body, "div", &["item"]).unwrap();
    let event = scheduler.dom().take_events().remove(0);
    scheduler.dom().fail_observe(1);
    let outcome = scheduler.handle(event).await.unwrap();

    assert_eq!(outcome, Some(CycleOutcome::Completed { evaluators: 1 }));
    assert_eq!(scheduler.state(), SchedulerState::Observing);
    assert_eq!(scheduler.dom().observing_generation(), Some(scheduler.generation()));

    // 监听已恢复，下一次变化照常处理
    scheduler.dom().add_element(body, "div", &["item"]).unwrap();
    let event = scheduler.dom().take_events().remove(0);
    scheduler.handle(event).await.unwrap();
    assert_eq!(runs.get(), 2);
}

#[tokio::test]
async fn test_failed_rearm_recovers_on_next_event() {
    let (evaluator, runs) = patcher(false);
    let mut scheduler = MutationScheduler::new(MemoryDom::new(COURSE_URL));
    scheduler.register(evaluator);
    assert_ok!(scheduler.start().await);

    let body = scheduler.dom().body();
    scheduler.dom().add_element(body, "div", &["item"]).unwrap();
    let event = scheduler.dom().take_events().remove(0);
    scheduler.dom().fail_observe(10);
    assert!(scheduler.handle(event).await.is_err());
    assert_eq!(scheduler.state(), SchedulerState::PendingResume);
    assert_eq!(scheduler.dom().observing_generation(), None);

    // 页面恢复后，随便一个事件都会先重新监听
    scheduler.dom().fail_observe(0);
    let outcome = scheduler
        .handle(HostEvent::TextCommitted {
            value: "tak".to_string(),
        })
        .await
        .unwrap();
    assert_eq!(outcome, None);
    assert_eq!(scheduler.state(), SchedulerState::Observing);
    assert_eq!(scheduler.dom().observing_generation(), Some(scheduler.generation()));

    scheduler.dom().add_element(body, "div", &["item"]).unwrap();
    let events = scheduler.dom().take_events();
    assert_eq!(events.len(), 1);
    let outcome = scheduler.handle(events[0].clone()).await.unwrap();
    assert_eq!(outcome, Some(CycleOutcome::Completed { evaluators: 1 }));
    assert_eq!(runs.get(), 2);
}
