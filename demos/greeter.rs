use std::cell::{Cell, RefCell};
use std::fmt::{Debug, Formatter, Result as FmtResult};
use std::rc::Rc;

use weave::prelude::*;
use weave::provider::TypedProvider;
use weave::reference::Dependency;

fn main() {
    let mut config = Config::new();

    config.bind::<&'static str>().named("app_name").to_instance("greeter");

    config.bind::<Rc<dyn Logger>>().to_component::<ConsoleLogger>().scoped(Singleton);
    config.bind::<Rc<dyn Stats>>().to_component::<StatsCounter>().scoped(Singleton);

    config
        .bind::<Rc<dyn Greeter>>()
        .qualified(GreeterKind::English)
        .to_component::<EnglishGreeter>();
    config
        .bind::<Rc<dyn Greeter>>()
        .qualified(GreeterKind::Chinese)
        .to_component::<ChineseGreeter>();

    config.bind::<Rc<App>>().to_component::<App>().scoped(Singleton);
    config.bind::<Rc<Connection>>().to_component::<Connection>().scoped(Pooled::new(2));

    let ctx = config.resolve().expect("the demo's own dependency graph is valid");

    let app = ctx.get(key::of::<Rc<App>>()).unwrap().unwrap();
    app.run();

    let stats = ctx.get(key::of::<Rc<dyn Stats>>()).unwrap().unwrap();
    eprintln!("logged {} messages", stats.logged_count());

    let c1 = ctx.get(key::of::<Rc<Connection>>()).unwrap().unwrap();
    let c2 = ctx.get(key::of::<Rc<Connection>>()).unwrap().unwrap();
    let c3 = ctx.get(key::of::<Rc<Connection>>()).unwrap().unwrap();
    eprintln!(
        "pool of 2 handed out slot 0 again on the 3rd request: {}",
        Rc::ptr_eq(&c1, &c3) && !Rc::ptr_eq(&c1, &c2)
    );
}

trait Logger: 'static {
    fn log(&self, message: &str);
}

struct ConsoleLogger {
    app_name: &'static str,
    stats: Lazy<Rc<dyn Stats>>,
}

// `stats` is requested as `Lazy<Rc<dyn Stats>>` rather than `Rc<dyn Stats>`
// directly: `StatsCounter` itself depends on `Logger` to report milestones,
// so a direct dependency in both directions would be a cycle the validator
// rejects. The `Lazy` edge is the one that doesn't count.
#[component(Rc<dyn Logger>, Rc::new)]
impl ConsoleLogger {
    #[inject]
    pub fn new(#[named("app_name")] app_name: &'static str, stats: Lazy<Rc<dyn Stats>>) -> Self {
        Self { app_name, stats }
    }
}

impl Logger for ConsoleLogger {
    fn log(&self, message: &str) {
        eprintln!("[{}] {}", self.app_name, message);
        if let Ok(stats) = self.stats.get() {
            stats.record_log();
        }
    }
}

trait Stats: 'static {
    fn record_log(&self);
    fn logged_count(&self) -> u32;
}

struct StatsCounter {
    logger: Rc<dyn Logger>,
    count: Cell<u32>,
}

#[component(Rc<dyn Stats>, Rc::new)]
impl StatsCounter {
    #[inject]
    pub fn new(logger: Rc<dyn Logger>) -> Self {
        Self { logger, count: Cell::new(0) }
    }
}

impl Stats for StatsCounter {
    fn record_log(&self) {
        self.count.set(self.count.get() + 1);
        if self.count.get() % 3 == 0 {
            self.logger.log(&format!("milestone: {} messages logged", self.count.get()));
        }
    }

    fn logged_count(&self) -> u32 {
        self.count.get()
    }
}

trait Greeter: 'static {
    fn greet(&self);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum GreeterKind {
    English,
    Chinese,
}

struct EnglishGreeter {
    logger: Rc<dyn Logger>,
}

#[component(Rc<dyn Greeter>, Rc::new)]
impl EnglishGreeter {
    #[inject]
    fn new(logger: Rc<dyn Logger>) -> Self {
        Self { logger }
    }
}

impl Greeter for EnglishGreeter {
    fn greet(&self) {
        self.logger.log("Hello World!");
    }
}

struct ChineseGreeter {
    logger: Rc<dyn Logger>,
}

#[component(Rc<dyn Greeter>, Rc::new)]
impl ChineseGreeter {
    #[inject]
    fn new(logger: Rc<dyn Logger>) -> Self {
        Self { logger }
    }
}

impl Greeter for ChineseGreeter {
    fn greet(&self) {
        self.logger.log("你好世界!");
    }
}

struct App {
    logger: Rc<dyn Logger>,
    greeters: Vec<Rc<dyn Greeter>>,
}

#[component(Rc<App>, Rc::new)]
impl App {
    #[inject]
    fn new(
        logger: Rc<dyn Logger>,
        #[qualified(GreeterKind::English)] english: Rc<dyn Greeter>,
        #[qualified(GreeterKind::Chinese)] chinese: Rc<dyn Greeter>,
    ) -> Self {
        Self { logger, greeters: vec![english, chinese] }
    }

    fn run(&self) {
        self.logger.log("Greeting from weave managed objects:");
        for greeter in &self.greeters {
            greeter.greet();
        }
    }
}

#[derive(Debug)]
struct Connection {
    app_name: &'static str,
}

#[component(Rc<Connection>, Rc::new)]
impl Connection {
    #[inject]
    fn new(#[named("app_name")] app_name: &'static str) -> Self {
        Self { app_name }
    }
}

/// A user-defined scope, shown here as the extension point the built-in
/// `Singleton` is one instance of: the first `max` requests each build and
/// keep a fresh value, everything after that round-robins through the pool.
struct Pooled {
    max: usize,
}

impl Pooled {
    fn new(max: usize) -> Self {
        Self { max }
    }
}

impl Scope for Pooled {
    fn wrap<T>(self, inner: Box<dyn TypedProvider<Output = T>>) -> Box<dyn TypedProvider<Output = T>>
    where
        T: Managed + Clone,
    {
        Box::new(PooledProvider {
            inner,
            max: self.max,
            pool: RefCell::new(Vec::new()),
            next: Cell::new(0),
        })
    }

    fn name(&self) -> &'static str {
        "Pooled"
    }
}

struct PooledProvider<T> {
    inner: Box<dyn TypedProvider<Output = T>>,
    max: usize,
    pool: RefCell<Vec<T>>,
    next: Cell<usize>,
}

impl<T> Debug for PooledProvider<T> {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.debug_struct("PooledProvider<T>").finish_non_exhaustive()
    }
}

impl<T> TypedProvider for PooledProvider<T>
where
    T: Managed + Clone,
{
    type Output = T;

    fn produce(&self, ctx: &Context) -> Result<Self::Output, Error> {
        let mut pool = self.pool.borrow_mut();
        if pool.len() < self.max {
            let value = self.inner.produce(ctx)?;
            pool.push(value.clone());
            return Ok(value);
        }

        let index = self.next.get() % pool.len();
        self.next.set(index + 1);
        Ok(pool[index].clone())
    }

    fn dependencies(&self) -> Vec<Dependency> {
        self.inner.dependencies()
    }
}
