//! Pure routing of rumqttc event loop events
//!
//! The publisher only cares about a handful of events: the CONNACK that ends the
//! handshake and the outgoing DISCONNECT that proves the queue was flushed.

use rumqttc::{ConnectReturnCode, Event, Outgoing, Packet};

/// Routing decisions for MQTT events
#[derive(Debug, Clone, PartialEq)]
pub enum EventRoute {
    /// Broker accepted the connection
    ConnectionAcknowledged,
    /// Broker answered CONNECT with a failure code
    ConnectionRefused(ConnectReturnCode),
    /// A queued publish was written to the socket
    PublishSent,
    /// Our DISCONNECT was written; everything queued before it is on the wire
    DisconnectSent,
    /// Broker closed the session
    DisconnectedByBroker,
    /// Anything else (PingResp, outgoing PingReq, ...)
    Other(String),
}

/// Pure message routing decisions based on MQTT events
pub struct MessageHandler;

impl MessageHandler {
    /// Route MQTT event to the publisher's view of it
    pub fn route_event(event: &Event) -> EventRoute {
        match event {
            Event::Incoming(Packet::ConnAck(connack)) => match connack.code {
                ConnectReturnCode::Success => EventRoute::ConnectionAcknowledged,
                code => EventRoute::ConnectionRefused(code),
            },
            Event::Incoming(Packet::Disconnect) => EventRoute::DisconnectedByBroker,
            Event::Outgoing(Outgoing::Publish(_)) => EventRoute::PublishSent,
            Event::Outgoing(Outgoing::Disconnect) => EventRoute::DisconnectSent,
            other => EventRoute::Other(format!("{other:?}")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rumqttc::ConnAck;

    #[test]
    fn test_route_connack_success() {
        let event = Event::Incoming(Packet::ConnAck(ConnAck::new(
            ConnectReturnCode::Success,
            false,
        )));
        assert_eq!(
            MessageHandler::route_event(&event),
            EventRoute::ConnectionAcknowledged
        );
    }

    #[test]
    fn test_route_connack_refused() {
        let event = Event::Incoming(Packet::ConnAck(ConnAck::new(
            ConnectReturnCode::NotAuthorized,
            false,
        )));
        assert_eq!(
            MessageHandler::route_event(&event),
            EventRoute::ConnectionRefused(ConnectReturnCode::NotAuthorized)
        );
    }

    #[test]
    fn test_route_outgoing() {
        assert_eq!(
            MessageHandler::route_event(&Event::Outgoing(Outgoing::Publish(0))),
            EventRoute::PublishSent
        );
        assert_eq!(
            MessageHandler::route_event(&Event::Outgoing(Outgoing::Disconnect)),
            EventRoute::DisconnectSent
        );
    }

    #[test]
    fn test_route_infrastructure_events() {
        assert!(matches!(
            MessageHandler::route_event(&Event::Incoming(Packet::PingResp)),
            EventRoute::Other(_)
        ));
        assert!(matches!(
            MessageHandler::route_event(&Event::Outgoing(Outgoing::PingReq)),
            EventRoute::Other(_)
        ));
    }

    #[test]
    fn test_route_broker_disconnect() {
        assert_eq!(
            MessageHandler::route_event(&Event::Incoming(Packet::Disconnect)),
            EventRoute::DisconnectedByBroker
        );
    }
}
