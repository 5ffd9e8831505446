use std::sync::Arc;

use tracing_subscriber::EnvFilter;
use wireup_di::{
    DependencyInfo, DiBuilder, DiHandle, InstanceFactory, RequireError, Resolver,
};

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug")))
        .init();

    let app = DiBuilder::new()
        .label("app")
        .add_instance("test".to_string())
        .add_factory(TestFactory)
        .build_eager()
        .unwrap();

    let request = app
        .child()
        .label("request")
        .add_instance(RequestId(7))
        .build()
        .unwrap();

    println!("{}", app.graph());
    println!("{:?}", request);
    let t = request.require::<Test>().unwrap();
    let id = request.require::<RequestId>().unwrap();
    println!("{:?} in request {}", t, id.0)
}

#[derive(Debug)]
struct RequestId(u64);

#[derive(Debug)]
struct Test {
    a: Arc<String>,
}
struct TestFactory;
impl InstanceFactory for TestFactory {
    type Provides = Test;
    fn get_dependencies() -> Vec<DependencyInfo> {
        vec![Arc::<String>::dependency_info()]
    }

    fn construct(&self, di: &DiHandle<'_>) -> Result<Self::Provides, RequireError> {
        Ok(Test { a: di.resolve()? })
    }
}
