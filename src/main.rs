use clap::Parser;
use log::{error, info, warn, LevelFilter};
use peer_ledger::{
    Command, Config, Node, Opt, PeerAddress, PeerTransport, Request, Response, Server,
    TcpTransport,
};
use std::path::PathBuf;
use std::process;
use std::sync::Arc;
use std::thread;

fn main() {
    env_logger::builder()
        .filter_level(LevelFilter::Info)
        .parse_default_env()
        .init();

    let opt = Opt::parse();
    if let Err(e) = run_command(opt) {
        error!("Error: {e}");
        process::exit(1);
    }
}

fn run_command(opt: Opt) -> Result<(), Box<dyn std::error::Error>> {
    let request = match opt.command {
        Command::StartNode {
            config,
            addr,
            difficulty,
            peers,
        } => return start_node(config, addr, difficulty, peers),
        Command::Submit { sender, data } => Request::SubmitTransaction { sender, data },
        Command::Mine => Request::Mine,
        Command::Chain => Request::GetChain,
        Command::Register { peers } => Request::RegisterPeers { peers },
        Command::Peers => Request::ListPeers,
        Command::Resolve => Request::Resolve,
    };

    let node = PeerAddress::parse(&opt.node)?;
    // mining can take arbitrarily long, so the client never times out on reads
    let transport = TcpTransport::new(Config::default().connect_timeout(), None);
    let response = transport.request(&node, &request)?;
    println!("{}", serde_json::to_string_pretty(&response)?);
    if let Response::Error { message } = response {
        return Err(format!("Node {node} refused the request: {message}").into());
    }
    Ok(())
}

fn start_node(
    config_path: Option<PathBuf>,
    addr: Option<String>,
    difficulty: Option<String>,
    peers: Vec<String>,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut config = Config::load(config_path.as_deref())?;
    if let Some(addr) = addr {
        config.address = addr;
    }
    if let Some(difficulty) = difficulty {
        config.difficulty = difficulty;
    }
    config.peers.extend(peers);
    config.validate()?;

    let transport: Arc<dyn PeerTransport> = Arc::new(TcpTransport::new(
        config.connect_timeout(),
        Some(config.io_timeout()),
    ));
    let node = Arc::new(Node::new(&config, transport)?);
    info!(
        "Starting node {} with difficulty {:?}",
        node.get_identifier(),
        node.proof_of_work().get_difficulty()
    );
    let server = Server::bind(Arc::clone(&node), &config.address)?;

    // seeds may gossip back to us, so register them once we are accepting
    if !config.peers.is_empty() {
        let seeds = config.peers.clone();
        thread::spawn(move || match node.register_peers(&seeds) {
            Ok(registration) => info!("Registered {} seed peers", registration.added.len()),
            Err(e) => warn!("Failed to register seed peers: {e}"),
        });
    }

    server.run()?;
    Ok(())
}
