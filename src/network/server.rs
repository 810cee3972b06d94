use crate::error::{LedgerError, Result};
use crate::network::{Request, Response};
use crate::node::{InboundOutcome, MineOutcome, Node};
use log::{error, info, warn};
use serde_json::Deserializer;
use std::io::{BufReader, Write};
use std::net::{Shutdown, SocketAddr, TcpListener, TcpStream};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

const TCP_READ_TIMEOUT: u64 = 60;

/// Serves one node over TCP, a thread per connection
pub struct Server {
    node: Arc<Node>,
    listener: TcpListener,
}

impl Server {
    pub fn bind(node: Arc<Node>, addr: &str) -> Result<Server> {
        let listener = TcpListener::bind(addr)
            .map_err(|e| LedgerError::Network(format!("Failed to bind to {addr}: {e}")))?;
        Ok(Server { node, listener })
    }

    pub fn local_addr(&self) -> Result<SocketAddr> {
        self.listener
            .local_addr()
            .map_err(|e| LedgerError::Network(format!("Failed to read local address: {e}")))
    }

    /// Accept connections until the listener fails.
    pub fn run(&self) -> Result<()> {
        info!(
            "Node {} listening on {}",
            self.node.get_identifier(),
            self.local_addr()?
        );

        for stream in self.listener.incoming() {
            match stream {
                Ok(stream) => {
                    let peer_addr = match stream.peer_addr() {
                        Ok(addr) => addr,
                        Err(e) => {
                            error!("Failed to get peer address: {e}");
                            continue;
                        }
                    };
                    let node = Arc::clone(&self.node);
                    thread::spawn(move || {
                        if let Err(e) = Self::handle_connection(&node, stream, peer_addr) {
                            warn!("Connection from {peer_addr} failed: {e}");
                        }
                    });
                }
                Err(e) => error!("Failed to accept connection: {e}"),
            }
        }
        Ok(())
    }

    fn handle_connection(node: &Node, stream: TcpStream, peer_addr: SocketAddr) -> Result<()> {
        stream
            .set_read_timeout(Some(Duration::from_secs(TCP_READ_TIMEOUT)))
            .map_err(|e| LedgerError::Network(format!("Failed to set read timeout: {e}")))?;

        let reader = BufReader::new(&stream);
        let request = Deserializer::from_reader(reader).into_iter::<Request>().next();

        let response = match request {
            Some(Ok(request)) => {
                info!("Received request from {peer_addr}: {}", describe(&request));
                process_request(node, request)
            }
            Some(Err(e)) => Response::Error {
                message: format!("Failed to deserialize request: {e}"),
            },
            None => return Ok(()),
        };

        let mut writer = &stream;
        serde_json::to_writer(&mut writer, &response)?;
        writer.flush()?;
        let _ = stream.shutdown(Shutdown::Both);
        Ok(())
    }
}

/// Run one request against the node and turn the outcome into a response.
pub fn process_request(node: &Node, request: Request) -> Response {
    match handle_request(node, request) {
        Ok(response) => response,
        Err(e) => {
            warn!("Request failed: {e}");
            Response::Error {
                message: e.to_string(),
            }
        }
    }
}

fn handle_request(node: &Node, request: Request) -> Result<Response> {
    let response = match request {
        Request::SubmitTransaction { sender, data } => Response::TransactionQueued {
            index: node.submit_transaction(&sender, data)?,
        },
        Request::Mine => match node.mine()? {
            MineOutcome::Forged { block, report } => Response::Forged {
                block,
                delivered: report.delivered,
                failed: report.failed,
            },
            MineOutcome::Superseded => Response::Superseded,
        },
        Request::GetChain => {
            let snapshot = node.chain_snapshot()?;
            Response::Chain {
                chain: snapshot.chain,
                length: snapshot.length,
            }
        }
        Request::NewBlock { block } => match node.receive_block(block)? {
            InboundOutcome::Accepted { index } => Response::BlockAccepted { index },
            InboundOutcome::Conflict { reason, resolution } => Response::BlockConflict {
                reason: reason.to_string(),
                replaced: resolution.replaced,
                length: resolution.chain.len(),
            },
            InboundOutcome::Rejected { reason } => Response::BlockRejected {
                reason: reason.to_string(),
            },
        },
        Request::RegisterPeers { peers } => Response::Peers {
            peers: node
                .register_peers(&peers)?
                .peers
                .iter()
                .map(ToString::to_string)
                .collect(),
        },
        Request::ListPeers => Response::Peers {
            peers: node
                .list_peers()?
                .iter()
                .map(ToString::to_string)
                .collect(),
        },
        Request::Resolve => {
            let resolution = node.resolve()?;
            Response::Resolved {
                replaced: resolution.replaced,
                chain: resolution.chain,
            }
        }
    };
    Ok(response)
}

// blocks and chains are too noisy to log whole
fn describe(request: &Request) -> String {
    match request {
        Request::NewBlock { block } => format!("NewBlock(index {})", block.get_index()),
        other => format!("{other:?}"),
    }
}
