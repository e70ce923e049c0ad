//! Integration tests for the WebSocket transport: a real server and a
//! real client, verifying bytes actually cross the network and that
//! the send and receive halves work concurrently.

#[cfg(feature = "websocket")]
mod websocket {
    use gavel_transport::{Connection, Transport, WebSocketTransport};

    use futures_util::{SinkExt, StreamExt};
    use tokio_tungstenite::tungstenite::Message;

    type ClientWs = tokio_tungstenite::WebSocketStream<
        tokio_tungstenite::MaybeTlsStream<tokio::net::TcpStream>,
    >;

    async fn connect_client(addr: &str) -> ClientWs {
        let url = format!("ws://{addr}");
        let (ws, _) = tokio_tungstenite::connect_async(&url)
            .await
            .expect("client should connect");
        ws
    }

    /// Binds on an ephemeral port and returns the transport with the
    /// address the OS picked.
    async fn bind_ephemeral() -> (WebSocketTransport, String) {
        let transport = WebSocketTransport::bind("127.0.0.1:0")
            .await
            .expect("should bind");
        let addr = transport.local_addr().unwrap().to_string();
        (transport, addr)
    }

    #[tokio::test]
    async fn test_accept_and_send_receive() {
        let (mut transport, addr) = bind_ephemeral().await;

        let server_handle = tokio::spawn(async move {
            transport.accept().await.expect("should accept")
        });

        let mut client_ws = connect_client(&addr).await;
        let server_conn = server_handle.await.expect("task should complete");

        assert!(server_conn.id().into_inner() > 0);

        // Server sends, client receives.
        server_conn
            .send(b"item update")
            .await
            .expect("send should succeed");
        let msg = client_ws.next().await.unwrap().unwrap();
        assert_eq!(msg.into_data().as_ref(), b"item update");

        // Client sends, server receives.
        client_ws
            .send(Message::Binary(b"place bid".to_vec().into()))
            .await
            .unwrap();
        let received = server_conn
            .recv()
            .await
            .expect("recv should succeed")
            .expect("should have data");
        assert_eq!(received, b"place bid");

        server_conn.close().await.expect("close should succeed");
    }

    #[tokio::test]
    async fn test_recv_returns_none_on_client_close() {
        let (mut transport, addr) = bind_ephemeral().await;

        let server_handle = tokio::spawn(async move {
            transport.accept().await.expect("should accept")
        });

        let mut client_ws = connect_client(&addr).await;
        let server_conn = server_handle.await.unwrap();

        client_ws.send(Message::Close(None)).await.unwrap();

        let result = server_conn.recv().await.expect("recv should not error");
        assert!(result.is_none(), "should return None on client close");
    }

    #[tokio::test]
    async fn test_send_while_recv_pending() {
        // The broadcast path: a clone of the connection pushes data out
        // while the original is blocked in recv. With a single lock for
        // both directions this would deadlock.
        let (mut transport, addr) = bind_ephemeral().await;

        let server_handle = tokio::spawn(async move {
            transport.accept().await.expect("should accept")
        });

        let mut client_ws = connect_client(&addr).await;
        let server_conn = server_handle.await.unwrap();

        // Park a recv with nothing to read.
        let reader = server_conn.clone();
        let recv_task = tokio::spawn(async move { reader.recv().await });

        // Give the recv task time to take the stream lock.
        tokio::time::sleep(std::time::Duration::from_millis(20)).await;

        // Sends must still complete.
        for i in 0..3u8 {
            server_conn.send(&[i]).await.expect("send should not block");
            let msg = client_ws.next().await.unwrap().unwrap();
            assert_eq!(msg.into_data().as_ref(), &[i]);
        }

        // Unblock the parked recv.
        client_ws
            .send(Message::Binary(b"done".to_vec().into()))
            .await
            .unwrap();
        let received = recv_task.await.unwrap().unwrap().unwrap();
        assert_eq!(received, b"done");
    }

    #[tokio::test]
    async fn test_connection_ids_are_unique() {
        let (mut transport, addr) = bind_ephemeral().await;

        let server_handle = tokio::spawn(async move {
            let first = transport.accept().await.expect("first accept");
            let second = transport.accept().await.expect("second accept");
            (first, second)
        });

        let _c1 = connect_client(&addr).await;
        let _c2 = connect_client(&addr).await;

        let (first, second) = server_handle.await.unwrap();
        assert_ne!(first.id(), second.id());
    }
}
