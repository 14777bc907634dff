use std::sync::Arc;

use bytes::BytesMut;
use tokio::io::AsyncWriteExt;
use tokio::net::TcpStream;
use tracing::{debug, warn};

use crate::{
    database::Database,
    input::{read_and_parse_resp, CommandReadError},
};

/// Serves one client until it disconnects. Commands are executed in the order they
/// were received and each reply is written before the next command runs.
pub async fn handle_client_connection(
    stream: TcpStream,
    database: Arc<Database>,
    client_address: String,
) {
    let mut buffer = BytesMut::with_capacity(4 * 1024);
    let (mut reader, mut writer) = stream.into_split();

    'connection: loop {
        let parsed_input = match read_and_parse_resp(&mut reader, &mut buffer).await {
            Ok(values) => values,
            Err(CommandReadError::ConnectionClosed) => break,
            Err(CommandReadError::IoError(err)) => {
                debug!(client = %client_address, error = %err, "read failed");
                break;
            }
            Err(e) => {
                if let Err(err) = write_to_stream(&mut writer, &e.as_bytes()).await {
                    warn!(client = %client_address, error = %err, "error writing to stream");
                    break 'connection;
                }
                continue;
            }
        };

        for input in parsed_input {
            let response = database.exec(&client_address, input).await;

            if let Err(err) = write_to_stream(&mut writer, &response).await {
                warn!(client = %client_address, error = %err, "error writing to stream");
                break 'connection;
            }
        }
    }

    database.drop_client(&client_address).await;
    debug!(client = %client_address, "client disconnected");
}

async fn write_to_stream<W>(writer: &mut W, response: &[u8]) -> tokio::io::Result<()>
where
    W: AsyncWriteExt + Unpin,
{
    writer.write_all(response).await?;
    writer.flush().await?;

    Ok(())
}
